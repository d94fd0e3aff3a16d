// Copyright (c) 2017-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Motion-vector-predictor resolution over the per-block ref-MV stacks.

use crate::mv::MotionVector;
use crate::predict::PredictionMode;
use crate::rate::{drl_bit_cost, mv_bit_cost};
use crate::refs::{RefFrames, MODE_CTX_REF_FRAMES};

pub const MAX_REF_MV_STACK_SIZE: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CandidateMV {
  pub this_mv: MotionVector,
  pub comp_mv: MotionVector,
  pub weight: u32,
}

/// The block's sorted predictor stacks, one per reference pair context,
/// filled by the neighbour scan that runs before mode decision.
#[derive(Clone)]
pub struct RefMvStacks {
  pub counts: [u8; MODE_CTX_REF_FRAMES],
  pub stacks: [[CandidateMV; MAX_REF_MV_STACK_SIZE]; MODE_CTX_REF_FRAMES],
}

impl Default for RefMvStacks {
  fn default() -> Self {
    RefMvStacks {
      counts: [0; MODE_CTX_REF_FRAMES],
      stacks: [[CandidateMV::default(); MAX_REF_MV_STACK_SIZE];
        MODE_CTX_REF_FRAMES],
    }
  }
}

impl RefMvStacks {
  #[inline]
  pub fn count(&self, rf: RefFrames) -> usize {
    self.counts[rf.mode_ctx_index()] as usize
  }

  #[inline]
  pub fn stack(&self, rf: RefFrames) -> &[CandidateMV] {
    let idx = rf.mode_ctx_index();
    &self.stacks[idx][..self.counts[idx] as usize]
  }

  /// Replaces the stack for one context; test and caller setup helper.
  pub fn set(&mut self, rf: RefFrames, entries: &[CandidateMV]) {
    let idx = rf.mode_ctx_index();
    assert!(entries.len() <= MAX_REF_MV_STACK_SIZE);
    self.counts[idx] = entries.len() as u8;
    self.stacks[idx][..entries.len()].copy_from_slice(entries);
  }

  /// Entry `drl` of the stack, zero MVs when the stack is shorter.
  #[inline]
  pub fn entry_or_zero(&self, rf: RefFrames, drl: usize) -> CandidateMV {
    let stack = self.stack(rf);
    stack.get(drl).copied().unwrap_or_default()
  }
}

/// Number of DRL choices a mode may signal given the stack population.
pub fn max_drl_index(ref_mv_count: usize, mode: PredictionMode) -> usize {
  use PredictionMode::*;
  match mode {
    NEWMV | NEW_NEWMV => 3.min(1.max(ref_mv_count.saturating_sub(1))),
    NEARMV | NEAR_NEARMV | NEAR_NEWMV | NEW_NEARMV => {
      3.min(1.max(ref_mv_count.saturating_sub(2)))
    }
    _ => 0,
  }
}

/// Resolved predictor MVs for one (mode, ref pair, drl) combination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MvPred {
  pub nearest: [MotionVector; 2],
  pub near: [MotionVector; 2],
  pub ref_mv: [MotionVector; 2],
}

/// Reads the stack for `rf` and resolves the NEAREST entry, the
/// DRL-indexed NEAR entry and the reference MV a NEW-type mode at `drl`
/// would be coded against.
pub fn get_mv_pred(
  stacks: &RefMvStacks, rf: RefFrames, mode: PredictionMode, drl: usize,
) -> MvPred {
  debug_assert!(drl < MAX_REF_MV_STACK_SIZE);
  let nearest = stacks.entry_or_zero(rf, 0);
  // NEAR entries start behind NEAREST
  let near_idx = if mode.has_nearmv() { 1 + drl } else { 1 };
  let near = stacks.entry_or_zero(rf, near_idx);
  let ref_entry = stacks.entry_or_zero(rf, drl);

  MvPred {
    nearest: [nearest.this_mv, nearest.comp_mv],
    near: [near.this_mv, near.comp_mv],
    ref_mv: [ref_entry.this_mv, ref_entry.comp_mv],
  }
}

/// Picks the DRL index for a NEW-type candidate by MV signalling cost:
/// for every legal index, the bit cost of coding the candidate MVs
/// against that entry (both lists for compound) plus the DRL bits; the
/// smallest total wins and ties keep the lowest index.
///
/// Returns the winning index and its predictor MVs.
pub fn choose_best_mv_pred(
  stacks: &RefMvStacks, rf: RefFrames, mode: PredictionMode,
  mv: [MotionVector; 2], allow_high_precision_mv: bool,
) -> (u8, [MotionVector; 2]) {
  let count = stacks.count(rf);
  let max_drl = max_drl_index(count, mode).max(1);
  let compound = rf.is_compound();

  let mut best_drl = 0usize;
  let mut best_pred = [MotionVector::default(); 2];
  let mut best_cost = u32::MAX;

  for drli in 0..max_drl {
    let entry = stacks.entry_or_zero(rf, drli);
    let pred = [entry.this_mv, entry.comp_mv];
    let mut cost = drl_bit_cost(drli)
      + mv_bit_cost(mv[0], pred[0], allow_high_precision_mv);
    if compound {
      cost += mv_bit_cost(mv[1], pred[1], allow_high_precision_mv);
    }
    if cost < best_cost {
      best_cost = cost;
      best_drl = drli;
      best_pred = pred;
    }
  }

  (best_drl as u8, best_pred)
}
