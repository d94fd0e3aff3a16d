// Copyright (c) 2017-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! The candidate record and the per-block "already injected" registries.

#![allow(non_camel_case_types)]

use crate::compound::CompoundType;
use crate::frame::WarpedMotionParams;
use crate::mv::MotionVector;
use crate::predict::{
  CflParams, FilterIntraMode, InterIntraMode, InterpFilters, MotionMode,
  PaletteInfo, PredictionMode,
};
use crate::refs::{RefFrames, RefType};

/// Capacity of the per-block fast candidate array. Injection past this
/// bound is truncated and reported.
pub const MODE_DECISION_CANDIDATE_MAX_COUNT: usize = 1855;

pub const CAND_CLASS_TOTAL: usize = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum CandidateClass {
  #[default]
  Intra = 0,
  NewMv = 1,
  Mvp = 2,
  Palette = 3,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PredDirection {
  #[default]
  UniPred0 = 0,
  UniPred1 = 1,
  BiPred = 2,
}

impl PredDirection {
  #[inline]
  pub fn from_refs(rf: RefFrames) -> Self {
    if rf.is_compound() {
      PredDirection::BiPred
    } else if rf.rf0().is_bwd_ref() {
      PredDirection::UniPred1
    } else {
      PredDirection::UniPred0
    }
  }
}

/// Compound-prediction descriptor of a bi-pred candidate.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InterInterCompound {
  pub comp_type: CompoundType,
  pub mask_type: u8,
  pub wedge_index: i8,
  pub wedge_sign: u8,
  pub comp_group_idx: u8,
  pub compound_idx: u8,
}

/// Inter-intra descriptor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InterIntra {
  pub enabled: bool,
  pub mode: InterIntraMode,
  pub use_wedge: bool,
  pub wedge_index: i8,
}

/// Intra-only attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntraInfo {
  pub luma_mode: PredictionMode,
  pub chroma_mode: PredictionMode,
  pub angle_delta_y: i8,
  pub angle_delta_uv: i8,
  pub cfl: CflParams,
  pub filter_intra_mode: Option<FilterIntraMode>,
  pub palette: Option<Box<PaletteInfo>>,
}

/// One tentative prediction, with everything needed to build and score it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModeDecisionCandidate {
  pub pred_mode: PredictionMode,
  pub use_intrabc: bool,
  pub skip_mode_allowed: bool,
  pub motion_mode: MotionMode,
  /// List 0 / list 1 motion vectors. The unused side of a uni-pred
  /// candidate stays zero.
  pub mv: [MotionVector; 2],
  pub pred_mv: [MotionVector; 2],
  pub drl_index: u8,
  pub ref_frames: RefFrames,
  pub pred_direction: PredDirection,
  pub compound: InterInterCompound,
  pub interintra: InterIntra,
  pub intra: IntraInfo,
  pub wm_params: [WarpedMotionParams; 2],
  pub local_warp_valid: bool,
  pub num_proj_ref: u8,
  pub interp_filters: InterpFilters,
  pub cand_class: CandidateClass,
}

impl ModeDecisionCandidate {
  #[inline]
  pub fn is_inter(&self) -> bool {
    self.pred_mode.is_inter() && !self.use_intrabc
  }

  #[inline]
  pub fn is_intra_kind(&self) -> bool {
    !self.pred_mode.is_inter() || self.use_intrabc
  }

  #[inline]
  pub fn is_compound(&self) -> bool {
    self.ref_frames.is_compound()
  }

  /// Fresh inter candidate with direction derived from the ref pair.
  pub fn inter(mode: PredictionMode, rf: RefFrames) -> Self {
    debug_assert!(mode.is_inter());
    debug_assert!(rf.is_compound() == mode.is_compound());
    ModeDecisionCandidate {
      pred_mode: mode,
      ref_frames: rf,
      pred_direction: PredDirection::from_refs(rf),
      ..Default::default()
    }
  }

  /// Fresh intra candidate on `(INTRA_FRAME, NONE_FRAME)`.
  pub fn intra(luma_mode: PredictionMode, chroma_mode: PredictionMode) -> Self {
    debug_assert!(luma_mode.is_intra());
    ModeDecisionCandidate {
      pred_mode: luma_mode,
      ref_frames: RefFrames::INTRA,
      intra: IntraInfo { luma_mode, chroma_mode, ..Default::default() },
      ..Default::default()
    }
  }
}

/// Key type of the uni-pred registries.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct UniKey {
  mv: MotionVector,
  ref_type: u8,
}

/// Key type of the bi-pred registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct BiKey {
  mv0: MotionVector,
  mv1: MotionVector,
  ref_type: u8,
}

/// Per-block record of the (MV, ref) keys each injector has already
/// emitted for. An injector checks the registry first, then after
/// actually emitting one or more candidates for an MV appends its key
/// exactly once regardless of how many compound / motion-mode variants
/// were spawned from it.
#[derive(Debug, Default)]
pub struct InjectedMvRegistry {
  l0: Vec<UniKey>,
  l1: Vec<UniKey>,
  bi: Vec<BiKey>,
}

impl InjectedMvRegistry {
  pub fn with_capacity(cap: usize) -> Self {
    InjectedMvRegistry {
      l0: Vec::with_capacity(cap),
      l1: Vec::with_capacity(cap),
      bi: Vec::with_capacity(cap),
    }
  }

  pub fn reset(&mut self) {
    self.l0.clear();
    self.l1.clear();
    self.bi.clear();
  }

  #[inline]
  pub fn l0_count(&self) -> usize {
    self.l0.len()
  }

  #[inline]
  pub fn l1_count(&self) -> usize {
    self.l1.len()
  }

  #[inline]
  pub fn bi_count(&self) -> usize {
    self.bi.len()
  }

  pub fn uni_injected(&self, mv: MotionVector, rf: RefType) -> bool {
    let key = UniKey { mv, ref_type: RefFrames::single(rf).packed() };
    let list = if rf.is_bwd_ref() { &self.l1 } else { &self.l0 };
    list.contains(&key)
  }

  pub fn record_uni(&mut self, mv: MotionVector, rf: RefType) {
    let key = UniKey { mv, ref_type: RefFrames::single(rf).packed() };
    let list = if rf.is_bwd_ref() { &mut self.l1 } else { &mut self.l0 };
    debug_assert!(!list.contains(&key));
    list.push(key);
  }

  pub fn bi_injected(&self, mvs: [MotionVector; 2], rf: RefFrames) -> bool {
    let key = BiKey { mv0: mvs[0], mv1: mvs[1], ref_type: rf.packed() };
    self.bi.contains(&key)
  }

  pub fn record_bi(&mut self, mvs: [MotionVector; 2], rf: RefFrames) {
    let key = BiKey { mv0: mvs[0], mv1: mvs[1], ref_type: rf.packed() };
    debug_assert!(!self.bi.contains(&key));
    self.bi.push(key);
  }

  /// Every registry holds pairwise-distinct keys.
  pub fn keys_are_distinct(&self) -> bool {
    fn distinct<K: PartialEq>(keys: &[K]) -> bool {
      keys
        .iter()
        .enumerate()
        .all(|(i, k)| keys[i + 1..].iter().all(|other| other != k))
    }
    distinct(&self.l0) && distinct(&self.l1) && distinct(&self.bi)
  }
}
