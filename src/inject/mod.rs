// Copyright (c) 2017-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Candidate injection: the source-specific injectors and the per-block
//! orchestrator that runs them in their contractual order.
//!
//! Ordering is part of the API: for one underlying MV the inter-intra
//! variants are injected before the OBMC variant, so on equal full-RD
//! cost the selector's first-minimum rule keeps the inter-intra one.

pub mod global;
pub mod intra;
pub mod mvp;
pub mod new;
pub mod warp;

use crate::candidate::ModeDecisionCandidate;
use crate::classify::{classify_candidates, decide_candidate_elimination};
use crate::compound::{compound_types_to_search, CompoundType};
use crate::error::MdError;
use crate::frame::{FrameInfo, SequenceInfo};
use crate::interintra::{
  is_interintra_allowed, is_interintra_allowed_bsize,
  precompute_intra_pred_for_inter_intra, search_interintra,
};
use crate::md::{BlockCtx, ModeDecisionContext};
use crate::mv::MotionVector;
use crate::mvp::choose_best_mv_pred;
use crate::obmc::{is_obmc_allowed, obmc_refine_mv};
use crate::oracle::{MaskedCompoundFit, MdOracles};
use crate::partition::MI_SIZE;
use crate::predict::{MotionMode, PredictionMode};
use crate::pruning::InterGroup;
use crate::refs::{RefFrames, RefType};
use crate::tile::{MvLimits, TileInfo};
use v_frame::pixel::Pixel;

/// Full-pel MV bounds keeping the whole block inside the tile.
pub(crate) fn block_mv_limits(
  tile: &TileInfo, mi_row: usize, mi_col: usize, w: usize, h: usize,
) -> MvLimits {
  let x = (mi_col * MI_SIZE) as isize;
  let y = (mi_row * MI_SIZE) as isize;
  MvLimits {
    col_min: (tile.left_px() - x) as i32,
    col_max: (tile.right_px() - x - w as isize) as i32,
    row_min: (tile.top_px() - y) as i32,
    row_max: (tile.bottom_px() - y - h as isize) as i32,
  }
}

#[inline]
pub(crate) fn mv_passes_tile<T: Pixel>(
  seq: &SequenceInfo, blk: &BlockCtx<'_, T>, mv: MotionVector,
) -> bool {
  seq.unrestricted_motion_vector
    || blk.tile.inside_tile_mv(
      mv,
      blk.geom.mi_col,
      blk.geom.mi_row,
      blk.geom.bsize,
    )
}

/// One uni-pred emission request; `emit_uni` spawns the simple,
/// inter-intra, OBMC and warped variants the request allows, each behind
/// its own validity gate.
pub(crate) struct UniCand {
  pub mode: PredictionMode,
  pub rf: RefType,
  pub mv: MotionVector,
  pub pred_mv: MotionVector,
  pub drl: u8,
  pub origin: InterGroup,
  pub allow_interintra: bool,
  pub allow_obmc: bool,
  pub allow_warp: bool,
  /// NEW-mode candidates refine the OBMC MV and re-pick their DRL.
  pub refine_obmc_mv: bool,
}

fn base_uni_candidate(req: &UniCand) -> ModeDecisionCandidate {
  let mut cand = ModeDecisionCandidate::inter(
    req.mode,
    RefFrames::single(req.rf),
  );
  let side = req.rf.list();
  cand.mv[side] = req.mv;
  cand.pred_mv[side] = req.pred_mv;
  cand.drl_index = req.drl;
  cand
}

pub(crate) fn emit_uni<T: Pixel, O: MdOracles<T>>(
  ctx: &mut ModeDecisionContext<T>, seq: &SequenceInfo, frame: &FrameInfo,
  blk: &BlockCtx<'_, T>, oracles: &O, req: UniCand,
) -> usize {
  if !mv_passes_tile(seq, blk, req.mv) {
    return 0;
  }

  let list = req.rf.list();
  let ref_idx = req.rf.ref_idx();
  let rf = RefFrames::single(req.rf);
  let mut emitted = 0usize;

  if ctx.ref_pruning.is_valid_uni_type(0, req.origin, list, ref_idx) {
    emitted += usize::from(ctx.push_candidate(base_uni_candidate(&req)));
  }

  if req.allow_interintra
    && is_interintra_allowed(&ctx.interintra_ctrls, blk.geom.bsize, req.mode, rf)
    && ctx.ii_pred_cache.is_valid()
    && ctx.ref_pruning.is_valid_uni_type(1, req.origin, list, ref_idx)
  {
    let search = search_interintra(
      oracles,
      blk.src,
      blk.src_off,
      &ctx.ii_pred_cache,
      rf,
      req.mv,
      blk.geom.bsize,
      blk.geom.mi_row,
      blk.geom.mi_col,
    );
    if ctx.interintra_ctrls.allow_wedge {
      let mut cand = base_uni_candidate(&req);
      cand.interintra.enabled = true;
      cand.interintra.mode = search.mode;
      cand.interintra.use_wedge = true;
      cand.interintra.wedge_index = search.wedge_index;
      emitted += usize::from(ctx.push_candidate(cand));
    }
    if ctx.ref_pruning.is_valid_uni_type(2, req.origin, list, ref_idx) {
      let mut cand = base_uni_candidate(&req);
      cand.interintra.enabled = true;
      cand.interintra.mode = search.mode;
      cand.interintra.use_wedge = false;
      cand.interintra.wedge_index = -1;
      emitted += usize::from(ctx.push_candidate(cand));
    }
  }

  if req.allow_obmc
    && is_obmc_allowed(
      &ctx.obmc_ctrls,
      frame,
      blk.geom.bsize,
      req.mode,
      rf,
      ctx.overlappable_neighbors,
    )
    && ctx.ref_pruning.is_valid_uni_type(4, req.origin, list, ref_idx)
  {
    if !ctx.obmc_data_ready {
      oracles.precompute_obmc_data(
        blk.geom.bsize,
        blk.geom.mi_row,
        blk.geom.mi_col,
      );
      ctx.obmc_data_ready = true;
    }
    let mut cand = base_uni_candidate(&req);
    cand.motion_mode = MotionMode::OBMC_CAUSAL;
    if req.refine_obmc_mv {
      let limits = block_mv_limits(
        &blk.tile,
        blk.geom.mi_row,
        blk.geom.mi_col,
        blk.geom.width(),
        blk.geom.height(),
      );
      if let Some(refined) =
        obmc_refine_mv(oracles, &ctx.obmc_ctrls, req.mv, &limits, blk.geom.bsize)
      {
        if mv_passes_tile(seq, blk, refined) {
          cand.mv[list] = refined;
          let (drl, pred) = choose_best_mv_pred(
            blk.mv_stacks,
            rf,
            req.mode,
            [refined, MotionVector::default()],
            frame.allow_high_precision_mv,
          );
          cand.drl_index = drl;
          cand.pred_mv[list] = pred[0];
        }
      }
    }
    emitted += usize::from(ctx.push_candidate(cand));
  }

  if req.allow_warp
    && !ctx.elimination.skip_warp
    && frame.is_motion_mode_switchable
    && blk.geom.width() >= 8
    && blk.geom.height() >= 8
    && ctx.ref_pruning.is_valid_uni_type(3, req.origin, list, ref_idx)
  {
    if let Some((wm, num_proj_ref)) = oracles.warped_motion_parameters(
      req.rf,
      req.mv,
      blk.geom.bsize,
      blk.geom.mi_row,
      blk.geom.mi_col,
    ) {
      let mut cand = base_uni_candidate(&req);
      cand.motion_mode = MotionMode::WARPED_CAUSAL;
      cand.wm_params[list] = wm;
      cand.local_warp_valid = true;
      cand.num_proj_ref = num_proj_ref;
      emitted += usize::from(ctx.push_candidate(cand));
    }
  }

  emitted
}

/// One bi-pred emission request, expanded across the compound types the
/// policy selects. `restrict_to_avg_dist` drops the masked types up
/// front (used by warped global compounds).
pub(crate) struct BiCand {
  pub mode: PredictionMode,
  pub rf: RefFrames,
  pub mv: [MotionVector; 2],
  pub pred_mv: [MotionVector; 2],
  pub drl: u8,
  pub restrict_to_avg_dist: bool,
  pub motion_mode: MotionMode,
  pub wm_params: Option<[crate::frame::WarpedMotionParams; 2]>,
}

pub(crate) fn emit_bi<T: Pixel, O: MdOracles<T>>(
  ctx: &mut ModeDecisionContext<T>, seq: &SequenceInfo, frame: &FrameInfo,
  blk: &BlockCtx<'_, T>, oracles: &O, req: BiCand,
) -> usize {
  if !mv_passes_tile(seq, blk, req.mv[0]) || !mv_passes_tile(seq, blk, req.mv[1])
  {
    return 0;
  }

  let types = compound_types_to_search(&ctx.inter_comp, frame, req.rf, |t| {
    ctx.ref_pruning.is_valid_bi_type(t, req.rf)
  });

  let mut emitted = 0usize;
  let mut mask_fit: Option<Result<MaskedCompoundFit, ()>> = None;

  for ctype in types {
    if req.restrict_to_avg_dist && ctype.is_masked() {
      continue;
    }
    let fit = if ctype.is_masked() {
      let fit = mask_fit.get_or_insert_with(|| {
        oracles.calc_pred_masked_compound(
          req.rf,
          req.mv,
          blk.geom.bsize,
          blk.geom.mi_row,
          blk.geom.mi_col,
        )
      });
      match &*fit {
        Ok(f) => Some(*f),
        // fit failed: the remaining masked types are dropped too
        Err(_) => continue,
      }
    } else {
      None
    };

    let mut cand = ModeDecisionCandidate::inter(req.mode, req.rf);
    cand.mv = req.mv;
    cand.pred_mv = req.pred_mv;
    cand.drl_index = req.drl;
    cand.motion_mode = req.motion_mode;
    if let Some(wm) = req.wm_params {
      cand.wm_params = wm;
      cand.local_warp_valid = true;
    }
    cand.compound.comp_type = ctype;
    let (group, index) = ctype.group_and_index();
    cand.compound.comp_group_idx = group;
    cand.compound.compound_idx = index;
    if let Some(f) = fit {
      cand.compound.mask_type = f.mask_type;
      cand.compound.wedge_index = f.wedge_index;
      cand.compound.wedge_sign = f.wedge_sign;
    }
    if ctype == CompoundType::COMPOUND_AVERAGE
      && crate::compound::matches_skip_mode_refs(&frame.skip_mode, req.rf)
    {
      cand.skip_mode_allowed = true;
    }
    emitted += usize::from(ctx.push_candidate(cand));
  }

  emitted
}

/// Runs the whole injection flow for one block. See the module docs
/// for the ordering contract.
pub fn generate_md_stage_0_candidates<T: Pixel, O: MdOracles<T>>(
  ctx: &mut ModeDecisionContext<T>, seq: &SequenceInfo, frame: &FrameInfo,
  blk: &BlockCtx<'_, T>, oracles: &O,
) -> Result<usize, MdError> {
  ctx.reset_for_block();

  let md_me_dist = blk.me.and_then(|m| m.md_me_dist);
  let pme_dist = blk.pme.and_then(|p| p.res_min_dist);
  ctx.elimination = decide_candidate_elimination(
    &ctx.cand_elim,
    frame,
    blk.geom.bsize,
    md_me_dist,
    pme_dist,
  );

  if !frame.slice_type.is_intra() {
    ctx.overlappable_neighbors = oracles.count_overlappable_neighbors(
      blk.geom.bsize,
      blk.geom.mi_row,
      blk.geom.mi_col,
    );
    if ctx.interintra_ctrls.enabled
      && is_interintra_allowed_bsize(blk.geom.bsize)
    {
      precompute_intra_pred_for_inter_intra(
        &mut ctx.ii_pred_cache,
        blk.above_edge,
        blk.left_edge,
        blk.geom.width(),
        blk.geom.height(),
      );
    }

    mvp::inject_mvp_candidates(ctx, seq, frame, blk, oracles);
    mvp::inject_new_nearest_combos(ctx, seq, frame, blk, oracles);
    new::inject_new_candidates(ctx, seq, frame, blk, oracles);
    new::inject_3x3_refinements(ctx, seq, frame, blk, oracles);
    global::inject_global_candidates(ctx, seq, frame, blk, oracles);
    new::inject_pme_candidates(ctx, seq, frame, blk, oracles);
    warp::inject_warped_new_candidates(ctx, seq, frame, blk, oracles);
  }

  intra::inject_intra_candidates(ctx, seq, frame, blk);
  intra::inject_palette_candidates(ctx, seq, frame, blk, oracles);
  intra::inject_intrabc_candidates(ctx, seq, frame, blk, oracles);

  // A non-I slice must never leave mode decision without a candidate.
  if !frame.slice_type.is_intra() && ctx.candidates.is_empty() {
    log::debug!(
      "no candidates injected at mi ({}, {}), falling back to ZZ",
      blk.geom.mi_row,
      blk.geom.mi_col
    );
    let mut cand = ModeDecisionCandidate::inter(
      PredictionMode::NEWMV,
      RefFrames::single(RefType::LAST_FRAME),
    );
    cand.mv[0] = MotionVector::default();
    ctx.push_candidate(cand);
  }

  ctx.md_stage_0_count = classify_candidates(
    &mut ctx.candidates,
    ctx.cand_elim.merge_inter_classes,
  );

  let count = ctx.candidate_count();
  if ctx.capacity_hit {
    Err(MdError::CandidateCapacity { injected: count })
  } else {
    Ok(count)
  }
}
