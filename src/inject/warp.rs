// Copyright (c) 2020-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Warped NEW-MV injection: perturb each ME MV over a neighbourhood and
//! keep the positions whose local warped-model fit is valid.
//!
//! Warped candidates intentionally bypass the translation dedup registry;
//! the same MV under WARPED_CAUSAL is a different prediction.

use super::mv_passes_tile;
use crate::candidate::{ModeDecisionCandidate, PredDirection};
use crate::frame::{FrameInfo, SequenceInfo};
use crate::md::{BlockCtx, ModeDecisionContext};
use crate::mv::MotionVector;
use crate::mvp::choose_best_mv_pred;
use crate::oracle::MdOracles;
use crate::predict::{MotionMode, PredictionMode};
use crate::pruning::InterGroup;
use crate::refs::{RefFrames, RefType};
use crate::serialize::{Deserialize, Serialize};
use v_frame::pixel::Pixel;

/// Warp-neighbourhood configuration; `neighbor_positions` is the
/// encoder-mode tri-state (1, 9 or 13 positions).
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct WarpCtrls {
  pub enabled: bool,
  pub neighbor_positions: usize,
}

impl Default for WarpCtrls {
  fn default() -> Self {
    WarpCtrls { enabled: true, neighbor_positions: 9 }
  }
}

// Centre, the unit ring, then the distance-2 axials; prefixes of this
// table give the 1 / 9 / 13 position sets.
const WARP_POSITIONS: [(i16, i16); 13] = [
  (0, 0),
  (-1, -1),
  (-1, 0),
  (-1, 1),
  (0, -1),
  (0, 1),
  (1, -1),
  (1, 0),
  (1, 1),
  (-2, 0),
  (0, -2),
  (0, 2),
  (2, 0),
];

/// WARPED_CAUSAL NEWMV candidates around each uni-pred ME MV. Every
/// perturbed MV goes through the warped-model fit; invalid fits inject
/// nothing.
pub fn inject_warped_new_candidates<T: Pixel, O: MdOracles<T>>(
  ctx: &mut ModeDecisionContext<T>, seq: &SequenceInfo, frame: &FrameInfo,
  blk: &BlockCtx<'_, T>, oracles: &O,
) {
  let Some(me) = blk.me else {
    return;
  };
  if !ctx.warp_ctrls.enabled
    || ctx.elimination.skip_warp
    || !frame.is_motion_mode_switchable
    || blk.geom.width() < 8
    || blk.geom.height() < 8
  {
    return;
  }

  let positions =
    &WARP_POSITIONS[..ctx.warp_ctrls.neighbor_positions.clamp(1, 13)];
  // full-pel perturbations
  let step: i16 = 8;

  for me_cand in &me.candidates {
    let list = match me_cand.direction {
      PredDirection::UniPred0 => 0,
      PredDirection::UniPred1 => 1,
      PredDirection::BiPred => continue,
    };
    let ref_idx = me_cand.ref_idx[list] as usize;
    let rf = RefType::from_list_idx(list, ref_idx);
    if !ctx.ref_pruning.is_valid_ref_type(InterGroup::Warp, rf) {
      continue;
    }
    let center = me_cand.mv[list].lower_precision(
      frame.allow_high_precision_mv,
      frame.force_integer_mv,
    );

    for &(dy, dx) in positions {
      let mv =
        MotionVector::new(center.col + dx * step, center.row + dy * step);
      if !mv.is_valid() || !mv_passes_tile(seq, blk, mv) {
        continue;
      }
      let Some((wm, num_proj_ref)) = oracles.warped_motion_parameters(
        rf,
        mv,
        blk.geom.bsize,
        blk.geom.mi_row,
        blk.geom.mi_col,
      ) else {
        continue;
      };

      let rfp = RefFrames::single(rf);
      let (drl, pred) = choose_best_mv_pred(
        blk.mv_stacks,
        rfp,
        PredictionMode::NEWMV,
        [mv, MotionVector::default()],
        frame.allow_high_precision_mv,
      );
      let mut cand =
        ModeDecisionCandidate::inter(PredictionMode::NEWMV, rfp);
      cand.mv[list] = mv;
      cand.pred_mv[list] = pred[0];
      cand.drl_index = drl;
      cand.motion_mode = MotionMode::WARPED_CAUSAL;
      cand.wm_params[list] = wm;
      cand.local_warp_valid = true;
      cand.num_proj_ref = num_proj_ref;
      ctx.push_candidate(cand);
    }
  }
}
