// Copyright (c) 2019-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Global-motion candidates: GLOBALMV / GLOBAL_GLOBALMV from the frame
//! models, warped when the model is beyond translation.

use super::{emit_bi, emit_uni, mv_passes_tile, BiCand, UniCand};
use crate::frame::{gm_get_motion_vector, FrameInfo, SequenceInfo};
use crate::md::{BlockCtx, ModeDecisionContext};
use crate::mv::MotionVector;
use crate::oracle::MdOracles;
use crate::predict::{MotionMode, PredictionMode};
use crate::pruning::InterGroup;
use crate::refs::{available_bi_refs, available_uni_refs, RefFrames};
use v_frame::pixel::Pixel;

/// Per reference (pair) with a nontrivial global model, inject the
/// model-implied MV. Translational models stay SIMPLE_TRANSLATION; any
/// higher model emits WARPED_CAUSAL, and warped compounds are limited to
/// the AVG/DIST compound types.
pub fn inject_global_candidates<T: Pixel, O: MdOracles<T>>(
  ctx: &mut ModeDecisionContext<T>, seq: &SequenceInfo, frame: &FrameInfo,
  blk: &BlockCtx<'_, T>, oracles: &O,
) {
  let bsize = blk.geom.bsize;

  for rf in available_uni_refs(frame.ref_list0_count, frame.ref_list1_count) {
    let gm = frame.global_motion_for(rf);
    if gm.is_identity() {
      continue;
    }
    if !ctx.ref_pruning.is_valid_ref_type(InterGroup::Global, rf) {
      continue;
    }
    let warped = !gm.is_translation()
      && !ctx.elimination.skip_warp
      && bsize.width() >= 8
      && bsize.height() >= 8;
    let mv = gm_get_motion_vector(
      gm,
      frame.allow_high_precision_mv,
      frame.force_integer_mv,
      bsize,
      blk.geom.mi_col,
      blk.geom.mi_row,
    );
    if ctx.injected.uni_injected(mv, rf) {
      continue;
    }
    let emitted = if warped {
      if !mv_passes_tile(seq, blk, mv) {
        continue;
      }
      let mut cand = crate::candidate::ModeDecisionCandidate::inter(
        PredictionMode::GLOBALMV,
        RefFrames::single(rf),
      );
      let side = rf.list();
      cand.mv[side] = mv;
      cand.pred_mv[side] = mv;
      cand.motion_mode = MotionMode::WARPED_CAUSAL;
      cand.wm_params[side] = *gm;
      cand.local_warp_valid = true;
      usize::from(ctx.push_candidate(cand))
    } else {
      emit_uni(
        ctx,
        seq,
        frame,
        blk,
        oracles,
        UniCand {
          mode: PredictionMode::GLOBALMV,
          rf,
          mv,
          pred_mv: mv,
          drl: 0,
          origin: InterGroup::Global,
          allow_interintra: false,
          allow_obmc: false,
          allow_warp: false,
          refine_obmc_mv: false,
        },
      )
    };
    if emitted > 0 {
      ctx.injected.record_uni(mv, rf);
    }
  }

  if !frame.compound_allowed() {
    return;
  }

  for rfp in available_bi_refs(frame.ref_list0_count, frame.ref_list1_count) {
    let gm0 = frame.global_motion_for(rfp.rf0());
    let gm1 = frame.global_motion_for(rfp.rf1());
    if gm0.is_identity() || gm1.is_identity() {
      continue;
    }
    if !ctx.ref_pruning.is_valid_ref_pair(InterGroup::Global, rfp) {
      continue;
    }
    let mvs: [MotionVector; 2] = [
      gm_get_motion_vector(
        gm0,
        frame.allow_high_precision_mv,
        frame.force_integer_mv,
        bsize,
        blk.geom.mi_col,
        blk.geom.mi_row,
      ),
      gm_get_motion_vector(
        gm1,
        frame.allow_high_precision_mv,
        frame.force_integer_mv,
        bsize,
        blk.geom.mi_col,
        blk.geom.mi_row,
      ),
    ];
    if ctx.injected.bi_injected(mvs, rfp) {
      continue;
    }
    let warped = !(gm0.is_translation() && gm1.is_translation())
      && !ctx.elimination.skip_warp
      && bsize.width() >= 8
      && bsize.height() >= 8;
    let emitted = emit_bi(
      ctx,
      seq,
      frame,
      blk,
      oracles,
      BiCand {
        mode: PredictionMode::GLOBAL_GLOBALMV,
        rf: rfp,
        mv: mvs,
        pred_mv: mvs,
        drl: 0,
        // compound + warped is restricted to the AVG/DIST types
        restrict_to_avg_dist: warped,
        motion_mode: if warped {
          MotionMode::WARPED_CAUSAL
        } else {
          MotionMode::SIMPLE_TRANSLATION
        },
        wm_params: if warped { Some([*gm0, *gm1]) } else { None },
      },
    );
    if emitted > 0 {
      ctx.injected.record_bi(mvs, rfp);
    }
  }
}
