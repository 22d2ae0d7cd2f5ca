//! Drives one or two samplers and, for two sources, the merge that joins them.

use std::{path::Path, sync::mpsc};

use crate::{
    config::JobConfig,
    foundation::{
        core::CropSettings,
        error::{FramestripError, FramestripResult},
    },
    media::{ffmpeg::FfmpegSession, session::DecodeSession},
    merge::{DualMerger, MergedFrameSequence},
    sample::{CancelToken, FrameSampler, FrameSequence, ProgressSink},
    validate::SourceLimits,
};

/// Which of the two sources a report or result belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum SourceSlot {
    First,
    Second,
}

/// One value per source, held in named fields.
#[derive(Clone, Debug)]
pub struct DualSlots<T> {
    pub first: T,
    pub second: T,
}

impl<T> DualSlots<T> {
    pub fn get(&self, slot: SourceSlot) -> &T {
        match slot {
            SourceSlot::First => &self.first,
            SourceSlot::Second => &self.second,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DualOutcome {
    pub sources: DualSlots<FrameSequence>,
    pub merged: MergedFrameSequence,
}

#[derive(Clone, Debug)]
pub struct Pipeline {
    sampler: FrameSampler,
    merger: DualMerger,
    frame_count: u32,
    crop: Option<CropSettings>,
    limits: SourceLimits,
}

impl Pipeline {
    pub fn from_config(cfg: &JobConfig) -> FramestripResult<Self> {
        cfg.validate()?;
        Ok(Self {
            sampler: FrameSampler::new(cfg.sampler_opts()),
            merger: DualMerger::new(cfg.merger_opts()),
            frame_count: cfg.frame_count,
            crop: cfg.crop,
            limits: cfg.limits,
        })
    }

    /// Stop future sampling at the next frame boundary when `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        let mut opts = self.sampler.opts().clone();
        opts.cancel = Some(cancel);
        self.sampler = FrameSampler::new(opts);
        self
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Check `path` against the configured limits and open it for decoding.
    pub fn open_source(&self, path: &Path) -> FramestripResult<FfmpegSession> {
        self.limits.check_file(path)?;
        let session = FfmpegSession::open(path)?;
        self.limits.check_info(session.info())?;
        Ok(session)
    }

    #[tracing::instrument(skip_all, fields(frame_count = self.frame_count))]
    pub fn sample_single<S, P>(
        &self,
        session: &mut S,
        progress: &mut P,
    ) -> FramestripResult<FrameSequence>
    where
        S: DecodeSession + ?Sized,
        P: ProgressSink + ?Sized,
    {
        self.sampler
            .sample(session, self.frame_count, self.crop.as_ref(), progress)
    }

    /// Sample both sources concurrently, wait for both, then merge.
    ///
    /// Progress from both samplers is delivered on the calling thread, tagged by slot. A failure
    /// in either source fails the whole run.
    #[tracing::instrument(skip_all, fields(frame_count = self.frame_count))]
    pub fn sample_dual<A, B, P>(
        &self,
        first: &mut A,
        second: &mut B,
        mut progress: P,
    ) -> FramestripResult<DualOutcome>
    where
        A: DecodeSession + ?Sized,
        B: DecodeSession + ?Sized,
        P: FnMut(SourceSlot, u8),
    {
        let (seq_first, seq_second) = std::thread::scope(|scope| {
            let (tx, rx) = mpsc::channel::<(SourceSlot, u8)>();

            let tx_first = tx.clone();
            let worker_first = scope.spawn(move || {
                self.sample_slot(first, |pct| {
                    let _ = tx_first.send((SourceSlot::First, pct));
                })
            });
            let tx_second = tx;
            let worker_second = scope.spawn(move || {
                self.sample_slot(second, |pct| {
                    let _ = tx_second.send((SourceSlot::Second, pct));
                })
            });

            // Ends once both workers have dropped their senders.
            for (slot, pct) in rx {
                progress(slot, pct);
            }

            let seq_first = worker_first
                .join()
                .map_err(|_| FramestripError::Other(anyhow::anyhow!("first sampler panicked")));
            let seq_second = worker_second
                .join()
                .map_err(|_| FramestripError::Other(anyhow::anyhow!("second sampler panicked")));
            (seq_first.and_then(|r| r), seq_second.and_then(|r| r))
        });

        let sources = DualSlots {
            first: seq_first?,
            second: seq_second?,
        };
        let merged = self.merger.merge(&sources.first, &sources.second)?;
        Ok(DualOutcome { sources, merged })
    }

    fn sample_slot<S, F>(&self, session: &mut S, mut progress: F) -> FramestripResult<FrameSequence>
    where
        S: DecodeSession + ?Sized,
        F: FnMut(u8),
    {
        self.sampler
            .sample(session, self.frame_count, self.crop.as_ref(), &mut progress)
    }
}
