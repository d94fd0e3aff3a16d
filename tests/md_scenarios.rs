// Copyright (c) 2020-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! End-to-end injection scenarios over a stubbed oracle seam.

use std::cell::RefCell;

use arrayvec::ArrayVec;
use av1_md::buffers::CandidateBuffer;
use av1_md::candidate::{CandidateClass, PredDirection};
use av1_md::compound::CompoundType;
use av1_md::frame::{
  FrameInfo, ReferenceMode, SequenceInfo, SkipModeParams, SliceType,
  WarpedMotionParams,
};
use av1_md::md::{
  BlockCtx, BlockGeom, MeCandidate, MeResults, ModeDecisionContext,
  PmeResults,
};
use av1_md::mv::MotionVector;
use av1_md::mvp::RefMvStacks;
use av1_md::oracle::{
  MaskedCompoundFit, MdOracles, RdEstimate, SearchResult,
};
use av1_md::partition::BlockSize;
use av1_md::predict::{InterIntraMode, MotionMode, PaletteInfo, PredictionMode};
use av1_md::refs::{RefFrames, RefType};
use av1_md::select::{commit_winner, select_best_candidate, BlockRecord, PdPass};
use av1_md::tile::{MvLimits, TileInfo};
use v_frame::pixel::{CastFromPrimitive, Pixel};
use v_frame::plane::{Plane, PlaneOffset};

/// Deterministic stand-in for the external pipeline.
#[derive(Default)]
struct StubOracles {
  /// Full-pel search results handed out in order (IntraBC DV search).
  dv_queue: RefCell<Vec<MotionVector>>,
  /// Warp fit behaviour: `true` returns a valid identity-based model.
  warp_fit_valid: bool,
  palettes: Vec<PaletteInfo>,
}

impl<T: Pixel> MdOracles<T> for StubOracles {
  fn predict_inter(
    &self, _rf: RefFrames, _mv: [MotionVector; 2], _bsize: BlockSize,
    _mi_row: usize, _mi_col: usize, dst: &mut Plane<T>, _dst_off: PlaneOffset,
  ) {
    for p in dst.data_origin_mut().iter_mut() {
      *p = T::cast_from(128u32);
    }
  }

  fn combine_interintra(
    &self, _mode: InterIntraMode, _wedge: Option<(i8, bool)>, w: usize,
    h: usize, inter: &Plane<T>, _intra: &Plane<T>, dst: &mut Plane<T>,
  ) {
    let src_stride = inter.cfg.stride;
    let dst_stride = dst.cfg.stride;
    for y in 0..h {
      for x in 0..w {
        let v = inter.data_origin()[y * src_stride + x];
        dst.data_origin_mut()[y * dst_stride + x] = v;
      }
    }
  }

  fn model_rd_curvfit(
    &self, _src: &Plane<T>, _src_off: PlaneOffset, _pred: &Plane<T>,
    _pred_off: PlaneOffset, w: usize, h: usize,
  ) -> RdEstimate {
    RdEstimate { rate: 8, distortion: (w * h) as u64 }
  }

  fn pick_wedge_fixed_sign(
    &self, _residual1: &[i16], _diff10: &[i16], _w: usize, _h: usize,
  ) -> (i8, u64) {
    (3, 100)
  }

  fn full_pixel_search(
    &self, _src: &Plane<T>, _src_off: PlaneOffset, _start_mv: MotionVector,
    _limits: &MvLimits, _w: usize, _h: usize,
  ) -> Option<SearchResult> {
    let mut queue = self.dv_queue.borrow_mut();
    if queue.is_empty() {
      None
    } else {
      Some(SearchResult { mv: queue.remove(0), distortion: 10 })
    }
  }

  fn obmc_full_pixel_search(
    &self, start_mv: MotionVector, _limits: &MvLimits, _w: usize, _h: usize,
  ) -> Option<SearchResult> {
    Some(SearchResult { mv: start_mv, distortion: 10 })
  }

  fn obmc_subpel_refine(
    &self, mv: MotionVector, _limits: &MvLimits, _w: usize, _h: usize,
  ) -> Option<MotionVector> {
    Some(mv)
  }

  fn warped_motion_parameters(
    &self, _rf: RefType, _mv: MotionVector, _bsize: BlockSize,
    _mi_row: usize, _mi_col: usize,
  ) -> Option<(WarpedMotionParams, u8)> {
    self.warp_fit_valid.then_some((WarpedMotionParams::IDENTITY, 2))
  }

  fn calc_pred_masked_compound(
    &self, _rf: RefFrames, _mv: [MotionVector; 2], _bsize: BlockSize,
    _mi_row: usize, _mi_col: usize,
  ) -> Result<MaskedCompoundFit, ()> {
    Ok(MaskedCompoundFit::default())
  }

  fn search_palette_luma(
    &self, _src: &Plane<T>, _src_off: PlaneOffset, _bsize: BlockSize,
    max_candidates: usize,
  ) -> ArrayVec<PaletteInfo, { av1_md::oracle::PALETTE_CAND_MAX }> {
    self.palettes.iter().take(max_candidates).cloned().collect()
  }

  fn precompute_obmc_data(
    &self, _bsize: BlockSize, _mi_row: usize, _mi_col: usize,
  ) {
  }

  fn count_overlappable_neighbors(
    &self, _bsize: BlockSize, _mi_row: usize, _mi_col: usize,
  ) -> (u8, u8) {
    (1, 1)
  }
}

struct Fixture {
  src: Plane<u8>,
  stacks: RefMvStacks,
  edges: (Vec<u8>, Vec<u8>),
}

impl Fixture {
  fn new() -> Self {
    Fixture {
      src: Plane::new(128, 128, 0, 0, 0, 0),
      stacks: RefMvStacks::default(),
      edges: (vec![128u8; 128], vec![128u8; 128]),
    }
  }

  fn block(&self, bsize: BlockSize, mi_row: usize, mi_col: usize) -> BlockCtx<'_, u8> {
    BlockCtx {
      geom: BlockGeom { mi_row, mi_col, bsize, blkidx_mds: 0, tx_depth: 0 },
      tile: TileInfo::frame_tile(256, 256),
      mv_stacks: &self.stacks,
      me: None,
      pme: None,
      src: &self.src,
      src_off: PlaneOffset { x: 0, y: 0 },
      above_edge: &self.edges.0,
      left_edge: &self.edges.1,
      chroma_cache: None,
    }
  }
}

fn quiet_ctx(seq: &SequenceInfo) -> ModeDecisionContext<u8> {
  // all optional injectors off; tests switch on what they exercise
  let mut ctx: ModeDecisionContext<u8> = ModeDecisionContext::new(seq);
  ctx.intra_ctrls.enabled = false;
  ctx.near_counts.enabled = false;
  ctx.mv3x3.enabled = false;
  ctx.warp_ctrls.enabled = false;
  ctx
}

fn p_frame() -> FrameInfo {
  FrameInfo {
    slice_type: SliceType::P,
    allow_high_precision_mv: true,
    ref_list0_count: 1,
    ..Default::default()
  }
}

fn b_frame() -> FrameInfo {
  FrameInfo {
    slice_type: SliceType::B,
    reference_mode: ReferenceMode::SELECT,
    allow_high_precision_mv: true,
    ref_list0_count: 1,
    ref_list1_count: 1,
    ..Default::default()
  }
}

fn uni_l0_me(mv: MotionVector) -> MeResults {
  MeResults {
    candidates: vec![MeCandidate {
      direction: PredDirection::UniPred0,
      mv: [mv, MotionVector::default()],
      ref_idx: [0, 0],
    }],
    ..Default::default()
  }
}

// An I-slice block with the intra sweep collapsed to DC.
#[test]
fn i_slice_dc_only_injects_single_intra() {
  let seq = SequenceInfo::default();
  let fixture = Fixture::new();
  let mut ctx = quiet_ctx(&seq);
  ctx.intra_ctrls.enabled = true;
  ctx.intra_ctrls.dc_only = true;
  let frame = FrameInfo::default();
  let blk = fixture.block(BlockSize::BLOCK_8X8, 0, 0);

  let count = ctx
    .inject_candidates(&seq, &frame, &blk, &StubOracles::default())
    .unwrap();
  assert_eq!(count, 1);
  assert_eq!(ctx.md_stage_0_count, [1, 0, 0, 0]);
  let cand = &ctx.candidates[0];
  assert_eq!(cand.intra.luma_mode, PredictionMode::DC_PRED);
  assert_eq!(cand.intra.angle_delta_y, 0);
  assert_eq!(cand.cand_class, CandidateClass::Intra);
}

// A P-slice block where the only source is a single uni-L0 ME result.
#[test]
fn p_slice_single_me_new() {
  let seq = SequenceInfo::default();
  let fixture = Fixture::new();
  let mut ctx = quiet_ctx(&seq);
  let frame = p_frame();
  let me = uni_l0_me(MotionVector::new(12, -4));
  let mut blk = fixture.block(BlockSize::BLOCK_16X16, 4, 4);
  blk.me = Some(&me);

  let count = ctx
    .inject_candidates(&seq, &frame, &blk, &StubOracles::default())
    .unwrap();
  assert_eq!(count, 1);
  let cand = &ctx.candidates[0];
  assert_eq!(cand.pred_mode, PredictionMode::NEWMV);
  assert_eq!(cand.cand_class, CandidateClass::NewMv);
  assert_eq!(cand.mv[0], MotionVector::new(12, -4));
  assert_eq!(cand.ref_frames, RefFrames::single(RefType::LAST_FRAME));
  assert_eq!(ctx.md_stage_0_count, [0, 1, 0, 0]);
  assert_eq!(ctx.injected.l0_count(), 1);
  assert!(ctx
    .injected
    .uni_injected(MotionVector::new(12, -4), RefType::LAST_FRAME));
}

// A B-slice bipred zero-MV ME result under the {AVG, DIST} compound
// mask, with skip-mode signalled on the matching reference pair.
#[test]
fn b_slice_bipred_avg_dist_with_skip_mode() {
  let seq = SequenceInfo::default();
  let fixture = Fixture::new();
  let mut ctx = quiet_ctx(&seq);
  let mut frame = b_frame();
  frame.skip_mode = SkipModeParams {
    skip_mode_allowed: true,
    ref0: RefType::LAST_FRAME,
    ref1: RefType::BWDREF_FRAME,
  };
  let me = MeResults {
    candidates: vec![MeCandidate {
      direction: PredDirection::BiPred,
      mv: [MotionVector::default(), MotionVector::default()],
      ref_idx: [0, 0],
    }],
    ..Default::default()
  };
  let mut blk = fixture.block(BlockSize::BLOCK_16X16, 4, 4);
  blk.me = Some(&me);

  let count = ctx
    .inject_candidates(&seq, &frame, &blk, &StubOracles::default())
    .unwrap();
  assert_eq!(count, 2);
  assert_eq!(ctx.md_stage_0_count, [0, 2, 0, 0]);

  let avg = &ctx.candidates[0];
  assert_eq!(avg.pred_mode, PredictionMode::NEW_NEWMV);
  assert_eq!(avg.compound.comp_type, CompoundType::COMPOUND_AVERAGE);
  assert!(avg.skip_mode_allowed);
  assert_eq!(avg.compound.comp_group_idx, 0);
  assert_eq!(avg.compound.compound_idx, 1);

  let dist = &ctx.candidates[1];
  assert_eq!(dist.compound.comp_type, CompoundType::COMPOUND_DISTWTD);
  assert!(!dist.skip_mode_allowed);

  assert_eq!(ctx.injected.bi_count(), 1);
}

// An I-slice with IntraBC on: two valid display vectors plus the DC
// candidate.
#[test]
fn i_slice_ibc_two_dvs_plus_dc() {
  let seq = SequenceInfo {
    enable_intrabc: true,
    ..Default::default()
  };
  let fixture = Fixture::new();
  let mut ctx = quiet_ctx(&seq);
  ctx.intra_ctrls.enabled = true;
  ctx.intra_ctrls.dc_only = true;
  ctx.intrabc_ctrls.enabled = true;
  ctx.intrabc_ctrls.search_left = true;
  let frame = FrameInfo { allow_intrabc: true, ..Default::default() };

  // both DVs land in already-reconstructed area for a block at mi (32, 96);
  // the leftward region needs the full decode-delay clearance
  let dv1 = MotionVector::new(0, -512);
  let dv2 = MotionVector::new(-512, -512);
  let oracles = StubOracles {
    dv_queue: RefCell::new(vec![dv1, dv2]),
    ..Default::default()
  };
  let blk = fixture.block(BlockSize::BLOCK_16X16, 32, 96);

  let count = ctx.inject_candidates(&seq, &frame, &blk, &oracles).unwrap();
  assert_eq!(count, 3);
  assert_eq!(ctx.md_stage_0_count, [3, 0, 0, 0]);

  let ibc: Vec<_> =
    ctx.candidates.iter().filter(|c| c.use_intrabc).collect();
  assert_eq!(ibc.len(), 2);
  for cand in &ibc {
    assert_eq!(cand.intra.luma_mode, PredictionMode::DC_PRED);
    assert_eq!(cand.ref_frames, RefFrames::INTRA);
    assert_eq!(cand.cand_class, CandidateClass::Intra);
  }
  assert_eq!(ibc[0].mv[0], dv1);
  assert_eq!(ibc[1].mv[0], dv2);
}

// Low-distortion elimination on a non-reference P frame.
#[test]
fn elimination_forces_dc_only_and_drops_worse_new_source() {
  let seq = SequenceInfo::default();
  let fixture = Fixture::new();

  let run = |me_dist: u64, pme_dist: u64| -> ModeDecisionContext<u8> {
    let mut ctx = quiet_ctx(&seq);
    ctx.intra_ctrls.enabled = true;
    ctx.warp_ctrls.enabled = true;
    ctx.cand_elim.enabled = true;
    let frame = FrameInfo {
      slice_type: SliceType::P,
      allow_high_precision_mv: true,
      is_motion_mode_switchable: true,
      temporal_layer_index: 3,
      is_used_as_reference: false,
      ref_list0_count: 1,
      ..p_frame()
    };
    let mut me = uni_l0_me(MotionVector::new(16, 0));
    me.md_me_dist = Some(me_dist);
    let mut pme = PmeResults::default();
    pme.best_mv[0][0] = MotionVector::new(24, 0);
    pme.valid[0][0] = true;
    pme.res_min_dist = Some(pme_dist);
    let mut blk = fixture.block(BlockSize::BLOCK_16X16, 4, 4);
    blk.me = Some(&me);
    blk.pme = Some(&pme);
    let oracles = StubOracles { warp_fit_valid: true, ..Default::default() };
    ctx.inject_candidates(&seq, &frame, &blk, &oracles).unwrap();
    ctx
  };

  // ME wins: the PME MV is absent, warp is gone, intra collapses to DC
  let ctx = run(4, 9);
  let mvs: Vec<MotionVector> = ctx
    .candidates
    .iter()
    .filter(|c| c.is_inter())
    .map(|c| c.mv[0])
    .collect();
  assert!(mvs.contains(&MotionVector::new(16, 0)));
  assert!(!mvs.contains(&MotionVector::new(24, 0)));
  assert!(ctx
    .candidates
    .iter()
    .all(|c| c.motion_mode != MotionMode::WARPED_CAUSAL));
  let intra: Vec<_> =
    ctx.candidates.iter().filter(|c| c.is_intra_kind()).collect();
  assert!(!intra.is_empty());
  assert!(intra
    .iter()
    .all(|c| c.intra.luma_mode == PredictionMode::DC_PRED));

  // PME wins: the ME MV is absent
  let ctx = run(9, 4);
  let mvs: Vec<MotionVector> = ctx
    .candidates
    .iter()
    .filter(|c| c.is_inter())
    .map(|c| c.mv[0])
    .collect();
  assert!(mvs.contains(&MotionVector::new(24, 0)));
  assert!(!mvs.contains(&MotionVector::new(16, 0)));
}

// Selector permutation behaviour over scored buffers.
#[test]
fn selector_permutation_and_commit() {
  let mut buffers: Vec<CandidateBuffer<u8>> =
    (0..4).map(|_| CandidateBuffer::new(16)).collect();
  for (buf, cost) in buffers.iter_mut().zip([100u64, 50, 50, 80]) {
    buf.full_cost = cost;
  }
  assert_eq!(select_best_candidate(&buffers, &[0, 1, 2, 3], 4), 1);
  assert_eq!(select_best_candidate(&buffers, &[0, 2, 1, 3], 4), 2);

  let winner = select_best_candidate(&buffers, &[0, 1, 2, 3], 4);
  let mut record = BlockRecord::default();
  commit_winner(&mut record, &buffers[winner], PdPass::Pd2);
  assert_eq!(record.cost, 50);
}

// A non-I slice with nothing to inject still produces the ZZ fallback
// candidate.
#[test]
fn zz_fallback_on_empty_p_slice() {
  let seq = SequenceInfo::default();
  let fixture = Fixture::new();
  let mut ctx = quiet_ctx(&seq);
  let frame = p_frame();
  let blk = fixture.block(BlockSize::BLOCK_16X16, 4, 4);

  let count = ctx
    .inject_candidates(&seq, &frame, &blk, &StubOracles::default())
    .unwrap();
  assert_eq!(count, 1);
  let cand = &ctx.candidates[0];
  assert_eq!(cand.pred_mode, PredictionMode::NEWMV);
  assert!(cand.mv[0].is_zero());
  assert_eq!(cand.ref_frames, RefFrames::single(RefType::LAST_FRAME));
}

// Across a broad mixed injection: class counts sum to the total,
// directions stay consistent with the ref table, registries stay
// duplicate-free and DRL indices stay legal.
#[test]
fn invariants_over_mixed_injection() {
  let seq = SequenceInfo::default();
  let mut fixture = Fixture::new();
  use av1_md::mvp::CandidateMV;
  fixture.stacks.set(
    RefFrames::single(RefType::LAST_FRAME),
    &[
      CandidateMV {
        this_mv: MotionVector::new(8, 0),
        comp_mv: MotionVector::default(),
        weight: 4,
      },
      CandidateMV {
        this_mv: MotionVector::new(16, 8),
        comp_mv: MotionVector::default(),
        weight: 2,
      },
      CandidateMV {
        this_mv: MotionVector::new(-8, 4),
        comp_mv: MotionVector::default(),
        weight: 2,
      },
    ],
  );
  fixture.stacks.set(
    RefFrames::pair(RefType::LAST_FRAME, RefType::BWDREF_FRAME),
    &[CandidateMV {
      this_mv: MotionVector::new(8, 0),
      comp_mv: MotionVector::new(-8, 0),
      weight: 2,
    }],
  );

  let mut ctx: ModeDecisionContext<u8> = ModeDecisionContext::new(&seq);
  ctx.interintra_ctrls.enabled = true;
  ctx.interintra_ctrls.allow_wedge = true;
  ctx.obmc_ctrls.enabled = true;
  ctx.inter_comp.allow_diff = true;
  ctx.inter_comp.allow_wedge = true;
  let mut frame = b_frame();
  frame.is_motion_mode_switchable = true;
  frame.skip_mode = SkipModeParams {
    skip_mode_allowed: true,
    ref0: RefType::LAST_FRAME,
    ref1: RefType::BWDREF_FRAME,
  };
  let me = MeResults {
    candidates: vec![
      MeCandidate {
        direction: PredDirection::UniPred0,
        mv: [MotionVector::new(32, -16), MotionVector::default()],
        ref_idx: [0, 0],
      },
      MeCandidate {
        direction: PredDirection::BiPred,
        mv: [MotionVector::new(8, 0), MotionVector::new(-8, 0)],
        ref_idx: [0, 0],
      },
    ],
    sb_me_mv: {
      let mut mvs = MeResults::default().sb_me_mv;
      mvs[0][0] = MotionVector::new(32, -16);
      mvs[1][0] = MotionVector::new(-24, 8);
      mvs
    },
    md_me_dist: None,
  };
  let mut blk = fixture.block(BlockSize::BLOCK_16X16, 8, 8);
  blk.me = Some(&me);
  let oracles = StubOracles { warp_fit_valid: true, ..Default::default() };

  let count = ctx.inject_candidates(&seq, &frame, &blk, &oracles).unwrap();
  assert!(count > 0);

  // class counts account for every candidate
  let total: usize = ctx.md_stage_0_count.iter().sum();
  assert_eq!(total, count);

  for cand in &ctx.candidates {
    // every MV inside the representable range
    for mv in cand.mv {
      if !mv.is_zero() {
        assert!(mv.is_valid());
      }
    }
    if cand.is_inter() {
      // direction consistent with the ref pair
      assert_eq!(cand.pred_direction, PredDirection::from_refs(cand.ref_frames));
      if cand.ref_frames.is_compound() {
        assert_eq!(cand.pred_direction, PredDirection::BiPred);
      }
      // the AVERAGE signalling contract
      if cand.compound.comp_type == CompoundType::COMPOUND_AVERAGE
        && cand.ref_frames.is_compound()
      {
        assert_eq!(cand.compound.comp_group_idx, 0);
        assert_eq!(cand.compound.compound_idx, 1);
      }
      // skip-mode only rides on AVG over the frame's skip-mode pair
      if cand.skip_mode_allowed {
        assert_eq!(cand.compound.comp_type, CompoundType::COMPOUND_AVERAGE);
        assert_eq!(cand.ref_frames.rf0(), frame.skip_mode.ref0);
        assert_eq!(cand.ref_frames.rf1(), frame.skip_mode.ref1);
      }
      // DRL index within the legal range for the mode
      let max_drl = av1_md::mvp::max_drl_index(
        blk.mv_stacks.count(cand.ref_frames),
        cand.pred_mode,
      );
      assert!((cand.drl_index as usize) <= max_drl.max(1) - 1 || max_drl == 0);
      // warped candidates only exist with a valid fit
      if cand.motion_mode == MotionMode::WARPED_CAUSAL {
        assert!(cand.local_warp_valid);
      }
      // tile containment
      assert!(blk.tile.inside_tile_mv(
        cand.mv[0],
        blk.geom.mi_col,
        blk.geom.mi_row,
        blk.geom.bsize
      ) || cand.mv[0].is_zero());
    }
  }

  // registries hold pairwise-distinct keys
  assert!(ctx.injected.keys_are_distinct());

  // the skip-mode pair really was exercised
  assert!(ctx.candidates.iter().any(|c| c.skip_mode_allowed));
}

// Palette candidates class as PALETTE and carry the palette through.
#[test]
fn palette_candidates_class_separately() {
  let seq = SequenceInfo { enable_palette: true, ..Default::default() };
  let fixture = Fixture::new();
  let mut ctx = quiet_ctx(&seq);
  ctx.intra_ctrls.enabled = true;
  ctx.intra_ctrls.dc_only = false;
  ctx.intra_ctrls.angle_delta_count = 1;
  let mut palette = PaletteInfo::default();
  palette.count = 4;
  palette.colors[..4].copy_from_slice(&[32, 96, 160, 224]);
  let oracles = StubOracles { palettes: vec![palette], ..Default::default() };
  let frame = FrameInfo::default();
  let blk = fixture.block(BlockSize::BLOCK_16X16, 4, 4);

  let count = ctx.inject_candidates(&seq, &frame, &blk, &oracles).unwrap();
  assert!(count > 1);
  assert_eq!(ctx.md_stage_0_count[CandidateClass::Palette as usize], 1);
  let pal = ctx
    .candidates
    .iter()
    .find(|c| c.cand_class == CandidateClass::Palette)
    .unwrap();
  assert_eq!(pal.intra.luma_mode, PredictionMode::DC_PRED);
  assert_eq!(pal.intra.palette.as_ref().unwrap().count, 4);
}
