// Copyright (c) 2018-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Predictor-derived injectors: NEAREST/NEAR (uni and compound) and the
//! mixed NEAREST/NEAR + NEW compound modes.

use super::{emit_bi, emit_uni, BiCand, UniCand};
use crate::frame::{FrameInfo, SequenceInfo};
use crate::md::{BlockCtx, ModeDecisionContext};
use crate::mvp::{get_mv_pred, max_drl_index};
use crate::oracle::MdOracles;
use crate::predict::{MotionMode, PredictionMode};
use crate::pruning::InterGroup;
use crate::refs::{available_bi_refs, available_uni_refs, RefFrames};
use crate::serialize::{Deserialize, Serialize};
use v_frame::pixel::Pixel;

/// How many NEAR / NEAR_NEAR DRL entries the MVP injector walks. The
/// mapping from encoder presets and block geometry to these counts is
/// caller policy.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct NearCountCtrls {
  pub enabled: bool,
  pub near_count: usize,
  pub near_near_count: usize,
}

impl Default for NearCountCtrls {
  fn default() -> Self {
    NearCountCtrls { enabled: true, near_count: 1, near_near_count: 1 }
  }
}

/// NEAREST and NEAR candidates per legal reference, compound
/// NEAREST_NEAREST / NEAR_NEAR per legal pair, each with the inter-intra,
/// OBMC and warped variants the gates allow.
pub fn inject_mvp_candidates<T: Pixel, O: MdOracles<T>>(
  ctx: &mut ModeDecisionContext<T>, seq: &SequenceInfo, frame: &FrameInfo,
  blk: &BlockCtx<'_, T>, oracles: &O,
) {
  if !ctx.near_counts.enabled {
    return;
  }

  for rf in available_uni_refs(frame.ref_list0_count, frame.ref_list1_count) {
    if !ctx.ref_pruning.is_valid_ref_type(InterGroup::NearestNear, rf) {
      continue;
    }
    let rfp = RefFrames::single(rf);
    let stack_count = blk.mv_stacks.count(rfp);

    let pred = get_mv_pred(blk.mv_stacks, rfp, PredictionMode::NEARESTMV, 0);
    let mv = pred.nearest[0];
    if !ctx.injected.uni_injected(mv, rf) {
      let emitted = emit_uni(
        ctx,
        seq,
        frame,
        blk,
        oracles,
        UniCand {
          mode: PredictionMode::NEARESTMV,
          rf,
          mv,
          pred_mv: mv,
          drl: 0,
          origin: InterGroup::NearestNear,
          allow_interintra: true,
          allow_obmc: true,
          allow_warp: true,
          refine_obmc_mv: false,
        },
      );
      if emitted > 0 {
        ctx.injected.record_uni(mv, rf);
      }
    }

    let near_count = ctx
      .near_counts
      .near_count
      .min(max_drl_index(stack_count, PredictionMode::NEARMV));
    for drl in 0..near_count {
      let pred = get_mv_pred(blk.mv_stacks, rfp, PredictionMode::NEARMV, drl);
      let mv = pred.near[0];
      if ctx.injected.uni_injected(mv, rf) {
        continue;
      }
      let emitted = emit_uni(
        ctx,
        seq,
        frame,
        blk,
        oracles,
        UniCand {
          mode: PredictionMode::NEARMV,
          rf,
          mv,
          pred_mv: mv,
          drl: drl as u8,
          origin: InterGroup::NearestNear,
          allow_interintra: true,
          allow_obmc: true,
          allow_warp: true,
          refine_obmc_mv: false,
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

  for rfp in available_bi_refs(frame.ref_list0_count, frame.ref_list1_count) {
    if !ctx.ref_pruning.is_valid_ref_pair(InterGroup::NearestNear, rfp) {
      continue;
    }
    let stack_count = blk.mv_stacks.count(rfp);

    let pred =
      get_mv_pred(blk.mv_stacks, rfp, PredictionMode::NEAREST_NEARESTMV, 0);
    let mvs = pred.nearest;
    if !ctx.injected.bi_injected(mvs, rfp) {
      let emitted = emit_bi(
        ctx,
        seq,
        frame,
        blk,
        oracles,
        BiCand {
          mode: PredictionMode::NEAREST_NEARESTMV,
          rf: rfp,
          mv: mvs,
          pred_mv: mvs,
          drl: 0,
          restrict_to_avg_dist: false,
          motion_mode: MotionMode::SIMPLE_TRANSLATION,
          wm_params: None,
        },
      );
      if emitted > 0 {
        ctx.injected.record_bi(mvs, rfp);
      }
    }

    let near_near_count = ctx
      .near_counts
      .near_near_count
      .min(max_drl_index(stack_count, PredictionMode::NEAR_NEARMV));
    for drl in 0..near_near_count {
      let pred =
        get_mv_pred(blk.mv_stacks, rfp, PredictionMode::NEAR_NEARMV, drl);
      let mvs = pred.near;
      if ctx.injected.bi_injected(mvs, rfp) {
        continue;
      }
      let emitted = emit_bi(
        ctx,
        seq,
        frame,
        blk,
        oracles,
        BiCand {
          mode: PredictionMode::NEAR_NEARMV,
          rf: rfp,
          mv: mvs,
          pred_mv: mvs,
          drl: drl as u8,
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

/// The mixed compound modes pairing a predictor MV on one side with
/// the ME NEW MV on the other. Requires ME data for the NEW side.
pub fn inject_new_nearest_combos<T: Pixel, O: MdOracles<T>>(
  ctx: &mut ModeDecisionContext<T>, seq: &SequenceInfo, frame: &FrameInfo,
  blk: &BlockCtx<'_, T>, oracles: &O,
) {
  let Some(me) = blk.me else {
    return;
  };
  if !frame.compound_allowed() || ctx.elimination.skip_new_me {
    return;
  }

  for rfp in available_bi_refs(frame.ref_list0_count, frame.ref_list1_count) {
    if !ctx.ref_pruning.is_valid_ref_pair(InterGroup::NearestNearNew, rfp) {
      continue;
    }
    let me_mv0 = me
      .mv_for(0, rfp.rf0().ref_idx())
      .map(|m| m.lower_precision(frame.allow_high_precision_mv, frame.force_integer_mv));
    let me_mv1 = me
      .mv_for(1, rfp.rf1().ref_idx())
      .map(|m| m.lower_precision(frame.allow_high_precision_mv, frame.force_integer_mv));
    let stack_count = blk.mv_stacks.count(rfp);

    // NEAREST on one side, NEW on the other
    let pred =
      get_mv_pred(blk.mv_stacks, rfp, PredictionMode::NEAREST_NEWMV, 0);
    if let Some(m1) = me_mv1 {
      let mvs = [pred.nearest[0], m1];
      if !ctx.injected.bi_injected(mvs, rfp) {
        let emitted = emit_bi(
          ctx,
          seq,
          frame,
          blk,
          oracles,
          BiCand {
            mode: PredictionMode::NEAREST_NEWMV,
            rf: rfp,
            mv: mvs,
            pred_mv: pred.nearest,
            drl: 0,
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
    if let Some(m0) = me_mv0 {
      let mvs = [m0, pred.nearest[1]];
      if !ctx.injected.bi_injected(mvs, rfp) {
        let emitted = emit_bi(
          ctx,
          seq,
          frame,
          blk,
          oracles,
          BiCand {
            mode: PredictionMode::NEW_NEARESTMV,
            rf: rfp,
            mv: mvs,
            pred_mv: pred.nearest,
            drl: 0,
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

    // NEAR on one side, NEW on the other, DRL-indexed on the NEAR side
    let near_count = ctx
      .near_counts
      .near_count
      .min(max_drl_index(stack_count, PredictionMode::NEAR_NEWMV));
    for drl in 0..near_count {
      let pred =
        get_mv_pred(blk.mv_stacks, rfp, PredictionMode::NEAR_NEWMV, drl);
      if let Some(m1) = me_mv1 {
        let mvs = [pred.near[0], m1];
        if !ctx.injected.bi_injected(mvs, rfp) {
          let emitted = emit_bi(
            ctx,
            seq,
            frame,
            blk,
            oracles,
            BiCand {
              mode: PredictionMode::NEAR_NEWMV,
              rf: rfp,
              mv: mvs,
              pred_mv: pred.near,
              drl: drl as u8,
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
      if let Some(m0) = me_mv0 {
        let mvs = [m0, pred.near[1]];
        if !ctx.injected.bi_injected(mvs, rfp) {
          let emitted = emit_bi(
            ctx,
            seq,
            frame,
            blk,
            oracles,
            BiCand {
              mode: PredictionMode::NEW_NEARMV,
              rf: rfp,
              mv: mvs,
              pred_mv: pred.near,
              drl: drl as u8,
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
