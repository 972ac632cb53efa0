// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background worker for segmentation requests.
//!
//! Prediction is slow, so it runs on its own thread; jobs and token-tagged
//! results travel over channels and the UI polls `try_recv` each frame.
//! Stale results are filtered by the session's token check, not here: the
//! worker just reports what it computed for which request.

use super::Segmentor;
use crate::models::mask::MaskLayer;
use crate::models::prompt::PromptPoint;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

/// Work item for the segmentation thread.
pub enum SegmentJob {
    /// Fix the source image for subsequent predictions.
    SetImage {
        rgba: Vec<u8>,
        width: u32,
        height: u32,
    },
    /// Run the predictor with the full accumulated point sequence.
    Predict {
        token: u64,
        points: Vec<PromptPoint>,
    },
}

/// Result of a predict job, tagged with the request token it answers.
pub struct SegmentResult {
    pub token: u64,
    pub outcome: Result<Option<MaskLayer>, String>,
}

/// Handle to the segmentation thread.
pub struct SegmentWorker {
    jobs: Sender<SegmentJob>,
    results: Receiver<SegmentResult>,
}

impl SegmentWorker {
    /// Spawn the worker around a predictor implementation.
    pub fn spawn(mut segmentor: Box<dyn Segmentor>) -> Self {
        let (job_tx, job_rx) = channel::<SegmentJob>();
        let (result_tx, result_rx) = channel::<SegmentResult>();

        std::thread::spawn(move || {
            while let Ok(job) = job_rx.recv() {
                match job {
                    SegmentJob::SetImage {
                        rgba,
                        width,
                        height,
                    } => {
                        if let Err(e) = segmentor.set_image(&rgba, width, height) {
                            log::error!("segmentor set_image failed: {e:#}");
                        }
                    }
                    SegmentJob::Predict { token, points } => {
                        let outcome = segmentor
                            .predict(&points)
                            .map_err(|e| format!("{e:#}"));
                        if result_tx
                            .send(SegmentResult { token, outcome })
                            .is_err()
                        {
                            break;
                        }
                    }
                }
            }
            log::debug!("segmentation worker stopped");
        });

        Self {
            jobs: job_tx,
            results: result_rx,
        }
    }

    pub fn submit(&self, job: SegmentJob) {
        if self.jobs.send(job).is_err() {
            log::error!("segmentation worker is gone");
        }
    }

    /// Non-blocking poll for the next finished prediction.
    pub fn poll(&self) -> Option<SegmentResult> {
        match self.results.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::prompt::PointLabel;
    use anyhow::Result;
    use std::time::Duration;

    /// Predictor that answers with a single pixel at the last point.
    struct FakeSegmentor {
        size: (u32, u32),
    }

    impl Segmentor for FakeSegmentor {
        fn set_image(&mut self, _rgba: &[u8], width: u32, height: u32) -> Result<()> {
            self.size = (width, height);
            Ok(())
        }

        fn predict(&mut self, points: &[PromptPoint]) -> Result<Option<MaskLayer>> {
            let (w, h) = self.size;
            let mut mask = MaskLayer::new(w, h);
            if let Some(p) = points.last() {
                mask.set(p.x as i32, p.y as i32, 1);
            }
            Ok(Some(mask))
        }
    }

    fn wait_for_result(worker: &SegmentWorker) -> SegmentResult {
        for _ in 0..200 {
            if let Some(result) = worker.poll() {
                return result;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("worker produced no result");
    }

    #[test]
    fn test_worker_round_trip_carries_token() {
        let worker = SegmentWorker::spawn(Box::new(FakeSegmentor { size: (0, 0) }));
        worker.submit(SegmentJob::SetImage {
            rgba: vec![0; 4 * 8 * 8],
            width: 8,
            height: 8,
        });
        worker.submit(SegmentJob::Predict {
            token: 7,
            points: vec![PromptPoint {
                x: 3,
                y: 4,
                label: PointLabel::Foreground,
            }],
        });

        let result = wait_for_result(&worker);
        assert_eq!(result.token, 7);
        let mask = result.outcome.unwrap().unwrap();
        assert_eq!(mask.get(3, 4), 1);
        assert_eq!(mask.count_ones(), 1);
    }
}
