// Copyright (c) 2020-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Distortion-based candidate elimination and the post-injection class
//! accounting.

use crate::candidate::{
  CandidateClass, ModeDecisionCandidate, CAND_CLASS_TOTAL,
};
use crate::frame::FrameInfo;
use crate::partition::BlockSize;
use crate::predict::PredictionMode;
use crate::serialize::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct CandEliminationCtrls {
  pub enabled: bool,
  /// Collapse the NEWMV and MVP classes into one (pure accounting).
  pub merge_inter_classes: bool,
}

/// Per-block gates derived from the ME/PME distortion before injection
/// starts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EliminationDecision {
  pub force_dc_only: bool,
  pub skip_warp: bool,
  pub skip_new_me: bool,
  pub skip_new_pme: bool,
}

/// Distortion threshold per 16x16 unit by temporal position: tightest on
/// the base layer, loosest on non-reference frames.
fn elimination_threshold(frame: &FrameInfo, bsize: BlockSize) -> u64 {
  let per_unit: u64 = if frame.temporal_layer_index == 0 {
    1
  } else if frame.is_used_as_reference {
    3
  } else {
    20
  };
  per_unit * (bsize.area() as u64) / 256
}

/// When the best known ME/PME distortion falls under the threshold the
/// block is trivially predictable: intra collapses to DC, warp is not
/// worth fitting, and only the better of the two NEW sources is kept.
pub fn decide_candidate_elimination(
  ctrls: &CandEliminationCtrls, frame: &FrameInfo, bsize: BlockSize,
  md_me_dist: Option<u64>, pme_res_min_dist: Option<u64>,
) -> EliminationDecision {
  let mut decision = EliminationDecision::default();
  if !ctrls.enabled {
    return decision;
  }

  let best_dist = match (md_me_dist, pme_res_min_dist) {
    (Some(me), Some(pme)) => me.min(pme),
    (Some(me), None) => me,
    (None, Some(pme)) => pme,
    (None, None) => return decision,
  };

  if best_dist < elimination_threshold(frame, bsize) {
    decision.force_dc_only = true;
    decision.skip_warp = true;
    if let (Some(me), Some(pme)) = (md_me_dist, pme_res_min_dist) {
      if me <= pme {
        decision.skip_new_pme = true;
      } else {
        decision.skip_new_me = true;
      }
    }
  }
  decision
}

/// Class a candidate belongs to for the md-stage-0 accounting.
pub fn cand_class_of(
  cand: &ModeDecisionCandidate, merge_inter_classes: bool,
) -> CandidateClass {
  if cand.is_intra_kind() {
    let has_palette = cand
      .intra
      .palette
      .as_ref()
      .is_some_and(|p| p.has_palette_y());
    if has_palette {
      CandidateClass::Palette
    } else {
      CandidateClass::Intra
    }
  } else if merge_inter_classes
    || matches!(
      cand.pred_mode,
      PredictionMode::NEWMV | PredictionMode::NEW_NEWMV
    )
  {
    CandidateClass::NewMv
  } else {
    CandidateClass::Mvp
  }
}

/// Assigns every candidate its class and returns the per-class counts.
///
/// # Panics
///
/// - If any non-zero candidate MV is outside the hard AV1 range; that is
///   a programmer error in an injector.
pub fn classify_candidates(
  candidates: &mut [ModeDecisionCandidate], merge_inter_classes: bool,
) -> [usize; CAND_CLASS_TOTAL] {
  let mut counts = [0usize; CAND_CLASS_TOTAL];
  for cand in candidates.iter_mut() {
    if cand.is_inter() || cand.use_intrabc {
      for mv in cand.mv {
        if !mv.is_zero() {
          assert!(mv.is_valid(), "candidate MV {mv:?} out of AV1 range");
        }
      }
    }
    let class = cand_class_of(cand, merge_inter_classes);
    cand.cand_class = class;
    counts[class as usize] += 1;
  }
  counts
}
