// Copyright (c) 2018-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! NEW-MV injectors: the ME pass results, their 3x3 refinements and the
//! PME-refined MVs.

use super::{emit_bi, emit_uni, BiCand, UniCand};
use crate::candidate::PredDirection;
use crate::frame::{FrameInfo, SequenceInfo};
use crate::md::{BlockCtx, ModeDecisionContext};
use crate::mv::MotionVector;
use crate::mvp::choose_best_mv_pred;
use crate::oracle::MdOracles;
use crate::predict::{MotionMode, PredictionMode};
use crate::pruning::InterGroup;
use crate::refs::{RefFrames, RefType, REFS_PER_LIST};
use crate::serialize::{Deserialize, Serialize};
use v_frame::pixel::Pixel;

/// 3x3 refinement configuration: the eight ring positions, or only the
/// four axial ones in diamond mode.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Mv3x3Ctrls {
  pub enabled: bool,
  pub diamond_only: bool,
}

impl Default for Mv3x3Ctrls {
  fn default() -> Self {
    Mv3x3Ctrls { enabled: true, diamond_only: false }
  }
}

const RING_POSITIONS: [(i16, i16); 8] = [
  (-1, -1),
  (-1, 0),
  (-1, 1),
  (0, -1),
  (0, 1),
  (1, -1),
  (1, 0),
  (1, 1),
];

const DIAMOND_POSITIONS: [(i16, i16); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

#[inline]
fn refinement_step(allow_high_precision_mv: bool) -> i16 {
  // 1/8-pel units; twice as coarse without high-precision MVs
  if allow_high_precision_mv {
    1
  } else {
    2
  }
}

fn uni_new_req(
  rf: RefType, mv: MotionVector, pred_mv: MotionVector, drl: u8,
  origin: InterGroup, with_variants: bool,
) -> UniCand {
  UniCand {
    mode: PredictionMode::NEWMV,
    rf,
    mv,
    pred_mv,
    drl,
    origin,
    allow_interintra: with_variants,
    allow_obmc: with_variants,
    allow_warp: false,
    refine_obmc_mv: with_variants,
  }
}

/// One NEWMV (or NEW_NEWMV) candidate per ME result at this block,
/// compound ME results expanded across the allowed compound types.
pub fn inject_new_candidates<T: Pixel, O: MdOracles<T>>(
  ctx: &mut ModeDecisionContext<T>, seq: &SequenceInfo, frame: &FrameInfo,
  blk: &BlockCtx<'_, T>, oracles: &O,
) {
  let Some(me) = blk.me else {
    return;
  };
  if ctx.elimination.skip_new_me {
    return;
  }

  for me_cand in &me.candidates {
    match me_cand.direction {
      PredDirection::UniPred0 | PredDirection::UniPred1 => {
        let list = me_cand.direction as usize;
        let ref_idx = me_cand.ref_idx[list] as usize;
        let rf = RefType::from_list_idx(list, ref_idx);
        let mv = me_cand.mv[list].lower_precision(
          frame.allow_high_precision_mv,
          frame.force_integer_mv,
        );
        if ctx.injected.uni_injected(mv, rf) {
          continue;
        }
        let rfp = RefFrames::single(rf);
        let (drl, pred) = choose_best_mv_pred(
          blk.mv_stacks,
          rfp,
          PredictionMode::NEWMV,
          [mv, MotionVector::default()],
          frame.allow_high_precision_mv,
        );
        let emitted = emit_uni(
          ctx,
          seq,
          frame,
          blk,
          oracles,
          uni_new_req(rf, mv, pred[0], drl, InterGroup::PaMe, true),
        );
        if emitted > 0 {
          ctx.injected.record_uni(mv, rf);
        }
      }
      PredDirection::BiPred => {
        if !frame.compound_allowed() {
          continue;
        }
        let rfp = RefFrames::pair(
          RefType::from_list_idx(0, me_cand.ref_idx[0] as usize),
          RefType::from_list_idx(1, me_cand.ref_idx[1] as usize),
        );
        if !ctx.ref_pruning.is_valid_ref_pair(InterGroup::PaMe, rfp) {
          continue;
        }
        let mvs = [
          me_cand.mv[0].lower_precision(
            frame.allow_high_precision_mv,
            frame.force_integer_mv,
          ),
          me_cand.mv[1].lower_precision(
            frame.allow_high_precision_mv,
            frame.force_integer_mv,
          ),
        ];
        if ctx.injected.bi_injected(mvs, rfp) {
          continue;
        }
        let (drl, pred) = choose_best_mv_pred(
          blk.mv_stacks,
          rfp,
          PredictionMode::NEW_NEWMV,
          mvs,
          frame.allow_high_precision_mv,
        );
        let emitted = emit_bi(
          ctx,
          seq,
          frame,
          blk,
          oracles,
          BiCand {
            mode: PredictionMode::NEW_NEWMV,
            rf: rfp,
            mv: mvs,
            pred_mv: pred,
            drl,
            restrict_to_avg_dist: false,
            motion_mode: MotionMode::SIMPLE_TRANSLATION,
            wm_params: None,
          },
        );
        if emitted > 0 {
          ctx.injected.record_bi(mvs, rfp);
        }
      }
    }
  }
}

/// NEWMV candidates on the ring (or diamond) around each ME MV.
/// Compound ME results refine one list at a time with the other held.
pub fn inject_3x3_refinements<T: Pixel, O: MdOracles<T>>(
  ctx: &mut ModeDecisionContext<T>, seq: &SequenceInfo, frame: &FrameInfo,
  blk: &BlockCtx<'_, T>, oracles: &O,
) {
  let Some(me) = blk.me else {
    return;
  };
  if !ctx.mv3x3.enabled || ctx.elimination.skip_new_me {
    return;
  }

  let positions: &[(i16, i16)] = if ctx.mv3x3.diamond_only {
    &DIAMOND_POSITIONS
  } else {
    &RING_POSITIONS
  };
  let step = refinement_step(frame.allow_high_precision_mv);

  for me_cand in &me.candidates {
    match me_cand.direction {
      PredDirection::UniPred0 | PredDirection::UniPred1 => {
        let list = me_cand.direction as usize;
        let ref_idx = me_cand.ref_idx[list] as usize;
        let rf = RefType::from_list_idx(list, ref_idx);
        if !ctx.ref_pruning.is_valid_ref_type(InterGroup::Uni3x3, rf) {
          continue;
        }
        let center = me_cand.mv[list].lower_precision(
          frame.allow_high_precision_mv,
          frame.force_integer_mv,
        );
        for &(dy, dx) in positions {
          let mv =
            MotionVector::new(center.col + dx * step, center.row + dy * step);
          if !mv.is_valid() || ctx.injected.uni_injected(mv, rf) {
            continue;
          }
          let rfp = RefFrames::single(rf);
          let (drl, pred) = choose_best_mv_pred(
            blk.mv_stacks,
            rfp,
            PredictionMode::NEWMV,
            [mv, MotionVector::default()],
            frame.allow_high_precision_mv,
          );
          let emitted = emit_uni(
            ctx,
            seq,
            frame,
            blk,
            oracles,
            uni_new_req(rf, mv, pred[0], drl, InterGroup::Uni3x3, false),
          );
          if emitted > 0 {
            ctx.injected.record_uni(mv, rf);
          }
        }
      }
      PredDirection::BiPred => {
        if !frame.compound_allowed() {
          continue;
        }
        let rfp = RefFrames::pair(
          RefType::from_list_idx(0, me_cand.ref_idx[0] as usize),
          RefType::from_list_idx(1, me_cand.ref_idx[1] as usize),
        );
        if !ctx.ref_pruning.is_valid_ref_pair(InterGroup::Bi3x3, rfp) {
          continue;
        }
        let center = [
          me_cand.mv[0].lower_precision(
            frame.allow_high_precision_mv,
            frame.force_integer_mv,
          ),
          me_cand.mv[1].lower_precision(
            frame.allow_high_precision_mv,
            frame.force_integer_mv,
          ),
        ];
        for refined_list in 0..2 {
          for &(dy, dx) in positions {
            let mut mvs = center;
            mvs[refined_list] = MotionVector::new(
              center[refined_list].col + dx * step,
              center[refined_list].row + dy * step,
            );
            if !mvs[refined_list].is_valid()
              || ctx.injected.bi_injected(mvs, rfp)
            {
              continue;
            }
            let (drl, pred) = choose_best_mv_pred(
              blk.mv_stacks,
              rfp,
              PredictionMode::NEW_NEWMV,
              mvs,
              frame.allow_high_precision_mv,
            );
            let emitted = emit_bi(
              ctx,
              seq,
              frame,
              blk,
              oracles,
              BiCand {
                mode: PredictionMode::NEW_NEWMV,
                rf: rfp,
                mv: mvs,
                pred_mv: pred,
                drl,
                restrict_to_avg_dist: false,
                motion_mode: MotionMode::SIMPLE_TRANSLATION,
                wm_params: None,
              },
            );
            if emitted > 0 {
              ctx.injected.record_bi(mvs, rfp);
            }
          }
        }
      }
    }
  }
}

/// NEW candidates from the PME refinement pass, per reference with a
/// valid PME MV, compound when both sides are valid. Warped and OBMC
/// variants ride along subject to the gates.
pub fn inject_pme_candidates<T: Pixel, O: MdOracles<T>>(
  ctx: &mut ModeDecisionContext<T>, seq: &SequenceInfo, frame: &FrameInfo,
  blk: &BlockCtx<'_, T>, oracles: &O,
) {
  let Some(pme) = blk.pme else {
    return;
  };
  if ctx.elimination.skip_new_pme {
    return;
  }

  for list in 0..2 {
    for ref_idx in 0..REFS_PER_LIST {
      if !pme.valid[list][ref_idx] {
        continue;
      }
      if list == 1 && ref_idx >= 3 {
        continue;
      }
      let rf = RefType::from_list_idx(list, ref_idx);
      let mv = pme.best_mv[list][ref_idx].lower_precision(
        frame.allow_high_precision_mv,
        frame.force_integer_mv,
      );
      if ctx.injected.uni_injected(mv, rf) {
        continue;
      }
      let rfp = RefFrames::single(rf);
      let (drl, pred) = choose_best_mv_pred(
        blk.mv_stacks,
        rfp,
        PredictionMode::NEWMV,
        [mv, MotionVector::default()],
        frame.allow_high_precision_mv,
      );
      let emitted = emit_uni(
        ctx,
        seq,
        frame,
        blk,
        oracles,
        UniCand {
          mode: PredictionMode::NEWMV,
          rf,
          mv,
          pred_mv: pred[0],
          drl,
          origin: InterGroup::PredMe,
          allow_interintra: false,
          allow_obmc: true,
          allow_warp: true,
          refine_obmc_mv: true,
        },
      );
      if emitted > 0 {
        ctx.injected.record_uni(mv, rf);
      }
    }
  }

  if !frame.compound_allowed() {
    return;
  }
  for i0 in 0..REFS_PER_LIST {
    for i1 in 0..3 {
      if !pme.valid[0][i0] || !pme.valid[1][i1] {
        continue;
      }
      let rfp = RefFrames::pair(
        RefType::from_list_idx(0, i0),
        RefType::from_list_idx(1, i1),
      );
      if !ctx.ref_pruning.is_valid_ref_pair(InterGroup::PredMe, rfp) {
        continue;
      }
      let mvs = [
        pme.best_mv[0][i0].lower_precision(
          frame.allow_high_precision_mv,
          frame.force_integer_mv,
        ),
        pme.best_mv[1][i1].lower_precision(
          frame.allow_high_precision_mv,
          frame.force_integer_mv,
        ),
      ];
      if ctx.injected.bi_injected(mvs, rfp) {
        continue;
      }
      let (drl, pred) = choose_best_mv_pred(
        blk.mv_stacks,
        rfp,
        PredictionMode::NEW_NEWMV,
        mvs,
        frame.allow_high_precision_mv,
      );
      let emitted = emit_bi(
        ctx,
        seq,
        frame,
        blk,
        oracles,
        BiCand {
          mode: PredictionMode::NEW_NEWMV,
          rf: rfp,
          mv: mvs,
          pred_mv: pred,
          drl,
          restrict_to_avg_dist: false,
          motion_mode: MotionMode::SIMPLE_TRANSLATION,
          wm_params: None,
        },
      );
      if emitted > 0 {
        ctx.injected.record_bi(mvs, rfp);
      }
    }
  }
}
