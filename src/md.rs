// Copyright (c) 2017-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! The per-context scratch state of one mode-decision worker and the
//! per-block inputs it consumes. One context processes one block at a
//! time; nothing here is shared across contexts.

use crate::buffers::ScratchPool;
use crate::candidate::{
  InjectedMvRegistry, ModeDecisionCandidate, CAND_CLASS_TOTAL,
  MODE_DECISION_CANDIDATE_MAX_COUNT,
};
use crate::classify::{CandEliminationCtrls, EliminationDecision};
use crate::compound::InterCompoundCtrls;
use crate::error::MdError;
use crate::frame::{FrameInfo, SequenceInfo};
use crate::inject;
use crate::inject::intra::IntraCtrls;
use crate::inject::mvp::NearCountCtrls;
use crate::inject::new::Mv3x3Ctrls;
use crate::inject::warp::WarpCtrls;
use crate::interintra::{InterIntraCtrls, InterIntraPredCache};
use crate::intrabc::IntraBcCtrls;
use crate::mv::MotionVector;
use crate::mvp::RefMvStacks;
use crate::obmc::ObmcCtrls;
use crate::oracle::MdOracles;
use crate::partition::BlockSize;
use crate::predict::PredictionMode;
use crate::pruning::RefPruningCtrls;
use crate::refs::REFS_PER_LIST;
use crate::tile::TileInfo;
use v_frame::pixel::Pixel;
use v_frame::plane::{Plane, PlaneOffset};

/// Geometry of the block under decision, fixed by the caller's tree walk.
#[derive(Copy, Clone, Debug)]
pub struct BlockGeom {
  pub mi_row: usize,
  pub mi_col: usize,
  pub bsize: BlockSize,
  /// Dense index of this block in the record arena.
  pub blkidx_mds: usize,
  pub tx_depth: u8,
}

impl BlockGeom {
  #[inline]
  pub fn width(&self) -> usize {
    self.bsize.width()
  }

  #[inline]
  pub fn height(&self) -> usize {
    self.bsize.height()
  }
}

/// One motion-estimation candidate at the block's offset.
#[derive(Copy, Clone, Debug)]
pub struct MeCandidate {
  pub direction: crate::candidate::PredDirection,
  pub mv: [MotionVector; 2],
  pub ref_idx: [u8; 2],
}

/// ME-pass outputs the injectors read.
#[derive(Clone, Debug)]
pub struct MeResults {
  pub candidates: Vec<MeCandidate>,
  /// Best ME MV per (list, ref); `INVALID_MV` marks an absent result.
  pub sb_me_mv: [[MotionVector; REFS_PER_LIST]; 2],
  pub md_me_dist: Option<u64>,
}

impl Default for MeResults {
  fn default() -> Self {
    MeResults {
      candidates: Vec::new(),
      sb_me_mv: [[crate::mv::INVALID_MV; REFS_PER_LIST]; 2],
      md_me_dist: None,
    }
  }
}

impl MeResults {
  /// The ME MV for `(list, ref_idx)` when the ME pass produced one.
  #[inline]
  pub fn mv_for(&self, list: usize, ref_idx: usize) -> Option<MotionVector> {
    let mv = self.sb_me_mv[list][ref_idx];
    (mv != crate::mv::INVALID_MV).then_some(mv)
  }
}

/// PME-pass outputs.
#[derive(Copy, Clone, Debug, Default)]
pub struct PmeResults {
  pub best_mv: [[MotionVector; REFS_PER_LIST]; 2],
  pub valid: [[bool; REFS_PER_LIST]; 2],
  pub res_min_dist: Option<u64>,
}

/// Everything the caller supplies for one block.
pub struct BlockCtx<'a, T: Pixel> {
  pub geom: BlockGeom,
  pub tile: TileInfo,
  pub mv_stacks: &'a RefMvStacks,
  pub me: Option<&'a MeResults>,
  pub pme: Option<&'a PmeResults>,
  pub src: &'a Plane<T>,
  pub src_off: PlaneOffset,
  /// Reconstructed neighbour rows for the inter-intra precompute.
  pub above_edge: &'a [T],
  pub left_edge: &'a [T],
  /// Chroma mode from the independent chroma search, when one ran.
  pub chroma_cache: Option<(PredictionMode, i8)>,
}

/// Per-worker mode-decision context: the fast candidate array, the dedup
/// registries and every injection control. Owned exclusively by one
/// worker; reset at block entry.
pub struct ModeDecisionContext<T: Pixel> {
  pub candidates: Vec<ModeDecisionCandidate>,
  /// Fast (md-stage-0) cost per candidate, parallel to `candidates`.
  pub fast_cost: Vec<u64>,
  pub md_stage_0_count: [usize; CAND_CLASS_TOTAL],
  pub injected: InjectedMvRegistry,
  pub ii_pred_cache: InterIntraPredCache<T>,
  pub scratch: ScratchPool<T>,
  pub obmc_data_ready: bool,
  pub overlappable_neighbors: (u8, u8),
  pub elimination: EliminationDecision,
  pub capacity_hit: bool,

  pub ref_pruning: RefPruningCtrls,
  pub inter_comp: InterCompoundCtrls,
  pub interintra_ctrls: InterIntraCtrls,
  pub obmc_ctrls: ObmcCtrls,
  pub near_counts: NearCountCtrls,
  pub mv3x3: Mv3x3Ctrls,
  pub warp_ctrls: WarpCtrls,
  pub intra_ctrls: IntraCtrls,
  pub intrabc_ctrls: IntraBcCtrls,
  pub cand_elim: CandEliminationCtrls,

  pub fast_lambda: u32,
  pub full_lambda: u32,
}

impl<T: Pixel> ModeDecisionContext<T> {
  pub fn new(seq: &SequenceInfo) -> Self {
    ModeDecisionContext {
      candidates: Vec::with_capacity(MODE_DECISION_CANDIDATE_MAX_COUNT),
      fast_cost: Vec::with_capacity(MODE_DECISION_CANDIDATE_MAX_COUNT),
      md_stage_0_count: [0; CAND_CLASS_TOTAL],
      injected: InjectedMvRegistry::with_capacity(128),
      ii_pred_cache: InterIntraPredCache::new(),
      scratch: ScratchPool::new(seq.sb_size),
      obmc_data_ready: false,
      overlappable_neighbors: (0, 0),
      elimination: EliminationDecision::default(),
      capacity_hit: false,
      ref_pruning: RefPruningCtrls::default(),
      inter_comp: InterCompoundCtrls::default(),
      interintra_ctrls: InterIntraCtrls::default(),
      obmc_ctrls: ObmcCtrls::default(),
      near_counts: NearCountCtrls::default(),
      mv3x3: Mv3x3Ctrls::default(),
      warp_ctrls: WarpCtrls::default(),
      intra_ctrls: IntraCtrls::default(),
      intrabc_ctrls: IntraBcCtrls::default(),
      cand_elim: CandEliminationCtrls::default(),
      fast_lambda: 0,
      full_lambda: 0,
    }
  }

  /// Clears every piece of per-block scratch. Must run at block entry.
  pub fn reset_for_block(&mut self) {
    self.candidates.clear();
    self.fast_cost.clear();
    self.md_stage_0_count = [0; CAND_CLASS_TOTAL];
    self.injected.reset();
    self.ii_pred_cache.invalidate();
    self.obmc_data_ready = false;
    self.overlappable_neighbors = (0, 0);
    self.elimination = EliminationDecision::default();
    self.capacity_hit = false;
  }

  #[inline]
  pub fn candidate_count(&self) -> usize {
    self.candidates.len()
  }

  /// Appends a fully-initialized candidate to the fast array. Returns
  /// whether it was stored; on overflow the candidate is dropped, the
  /// event is logged once and injection continues truncated.
  pub fn push_candidate(&mut self, cand: ModeDecisionCandidate) -> bool {
    if self.candidates.len() >= MODE_DECISION_CANDIDATE_MAX_COUNT {
      if !self.capacity_hit {
        log::error!(
          "fast candidate array full ({} candidates), truncating injection",
          self.candidates.len()
        );
        self.capacity_hit = true;
      }
      return false;
    }
    self.candidates.push(cand);
    self.fast_cost.push(0);
    true
  }

  /// Runs the full injection flow for one block: reset, source-specific
  /// injectors, elimination gating, classing. On return the fast array
  /// holds `candidate_total_count` fully-initialized candidates and
  /// `md_stage_0_count` sums to it.
  pub fn inject_candidates<O: MdOracles<T>>(
    &mut self, seq: &SequenceInfo, frame: &FrameInfo, blk: &BlockCtx<'_, T>,
    oracles: &O,
  ) -> Result<usize, MdError> {
    inject::generate_md_stage_0_candidates(self, seq, frame, blk, oracles)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn push_truncates_at_capacity() {
    let seq = SequenceInfo { sb_size: 16, ..Default::default() };
    let mut ctx: ModeDecisionContext<u8> = ModeDecisionContext::new(&seq);
    let cand = ModeDecisionCandidate::intra(
      PredictionMode::DC_PRED,
      PredictionMode::DC_PRED,
    );
    for _ in 0..MODE_DECISION_CANDIDATE_MAX_COUNT {
      assert!(ctx.push_candidate(cand.clone()));
    }
    assert!(!ctx.push_candidate(cand.clone()));
    assert!(ctx.capacity_hit);
    assert_eq!(ctx.candidate_count(), MODE_DECISION_CANDIDATE_MAX_COUNT);

    ctx.reset_for_block();
    assert_eq!(ctx.candidate_count(), 0);
    assert!(!ctx.capacity_hit);
    assert!(ctx.push_candidate(cand));
  }

  #[test]
  fn reset_clears_registry() {
    let seq = SequenceInfo::default();
    let mut ctx: ModeDecisionContext<u8> = ModeDecisionContext::new(&seq);
    ctx
      .injected
      .record_uni(MotionVector::new(4, 4), crate::refs::RefType::LAST_FRAME);
    ctx.reset_for_block();
    assert!(!ctx
      .injected
      .uni_injected(MotionVector::new(4, 4), crate::refs::RefType::LAST_FRAME));
  }
}
