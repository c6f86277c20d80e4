//! Driving a conversion session to input exhaustion.

use aulos_engine::EngineSession;
use tracing::trace;

use crate::{
    error::{StreamError, StreamResult},
    task::{ConvertTask, FlushTask},
};

/// Consecutive zero-consumption iterations tolerated before a task fails.
const STALL_LIMIT: u32 = 2;

/// Feed `input` to the session until fully consumed, appending produced
/// frames at the shared output cursor.
///
/// A session may take several calls to accept everything; the loop only ends
/// when the input cursor reaches the end. Zero consumption twice in a row
/// with input remaining is an engine fault, not something to wait out.
fn drive<S: EngineSession>(
    session: &mut S,
    input: &[f32],
    output: &mut [f32],
    cursor: &mut usize,
) -> StreamResult<()> {
    let mut consumed = 0;
    let mut stalls = 0;

    while consumed < input.len() {
        let advance = session.process(&input[consumed..], &mut output[*cursor..])?;
        consumed += advance.frames_used;
        *cursor += advance.frames_produced;

        if advance.frames_used == 0 {
            stalls += 1;
            if stalls >= STALL_LIMIT {
                return Err(StreamError::EngineStalled {
                    remaining: input.len() - consumed,
                });
            }
        } else {
            stalls = 0;
        }
    }

    Ok(())
}

/// Run a conversion task: the completed prefix first, then the body, sharing
/// one output cursor.
pub(crate) fn run_convert<S: EngineSession>(
    session: &mut S,
    task: &mut ConvertTask,
) -> StreamResult<()> {
    let mut cursor = task.produced;
    drive(session, &task.prefix, &mut task.output, &mut cursor)?;
    drive(session, &task.body, &mut task.output, &mut cursor)?;
    task.produced = cursor;

    trace!(
        prefix_frames = task.prefix.len(),
        body_frames = task.body.len(),
        produced = task.produced,
        "conversion task complete"
    );
    Ok(())
}

/// Run a flush task: a single drain call with no new input.
pub(crate) fn run_flush<S: EngineSession>(
    session: &mut S,
    task: &mut FlushTask,
) -> StreamResult<()> {
    let produced = session.drain(&mut task.output[task.produced..])?;
    task.produced += produced;

    trace!(produced, "flush task complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use aulos_engine::{MockBackend, Quality, ResampleBackend};

    use super::*;
    use crate::frame::Aligned;

    fn frames_to_bytes(frames: &[f32]) -> Vec<u8> {
        frames.iter().flat_map(|f| f.to_ne_bytes()).collect()
    }

    fn convert_task(frames: &[f32], factor: f64) -> ConvertTask {
        let aligned = Aligned {
            prefix: Vec::new(),
            body: frames_to_bytes(frames),
        };
        ConvertTask::new(aligned, factor)
    }

    #[test]
    fn test_single_shot_consumption() {
        let mut session = MockBackend::new().open(Quality::High, 1.0).unwrap();
        let mut task = convert_task(&[0.1, 0.2, 0.3], 1.0);

        run_convert(&mut session, &mut task).unwrap();
        assert_eq!(task.produced, 3);
        assert_eq!(&task.output[..3], &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_partial_consumption_loops_until_done() {
        let backend = MockBackend::new().with_chunk_limit(2);
        let mut session = backend.open(Quality::High, 1.0).unwrap();
        let input: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let mut task = convert_task(&input, 1.0);

        run_convert(&mut session, &mut task).unwrap();
        assert_eq!(task.produced, 10);
        assert_eq!(&task.output[..10], input.as_slice());
    }

    #[test]
    fn test_prefix_then_body_share_cursor() {
        let mut session = MockBackend::new().open(Quality::High, 1.0).unwrap();
        let first = 1.5_f32.to_ne_bytes();
        let second = 2.5_f32.to_ne_bytes();
        let aligned = Aligned {
            prefix: first[..3].to_vec(),
            body: [&first[3..], &second[..]].concat(),
        };
        let mut task = ConvertTask::new(aligned, 1.0);

        run_convert(&mut session, &mut task).unwrap();
        assert_eq!(task.produced, 2);
        assert_eq!(&task.output[..2], &[1.5, 2.5]);
    }

    #[test]
    fn test_empty_task_never_calls_engine() {
        // A stalling session would error on the first call; an empty task
        // must complete without touching it.
        let backend = MockBackend::new().with_stall();
        let mut session = backend.open(Quality::High, 1.0).unwrap();
        let mut task = ConvertTask::new(Aligned::default(), 1.0);

        run_convert(&mut session, &mut task).unwrap();
        assert_eq!(task.produced, 0);
    }

    #[test]
    fn test_stalled_engine_faults_the_task() {
        let backend = MockBackend::new().with_stall();
        let mut session = backend.open(Quality::High, 1.0).unwrap();
        let mut task = convert_task(&[0.1, 0.2], 1.0);

        let err = run_convert(&mut session, &mut task).unwrap_err();
        assert!(matches!(err, StreamError::EngineStalled { remaining: 2 }));
    }

    #[test]
    fn test_flush_advances_cursor() {
        let backend = MockBackend::new().with_flush_tail(5);
        let mut session = backend.open(Quality::High, 1.0).unwrap();
        let mut task = FlushTask::new(1.0);

        run_flush(&mut session, &mut task).unwrap();
        assert_eq!(task.produced, 5);
    }

    #[test]
    fn test_flush_without_tail_is_empty() {
        let mut session = MockBackend::new().open(Quality::High, 1.0).unwrap();
        let mut task = FlushTask::new(1.0);

        run_flush(&mut session, &mut task).unwrap();
        assert_eq!(task.produced, 0);
        assert!(task.into_output().is_empty());
    }
}
