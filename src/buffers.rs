// Copyright (c) 2019-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Candidate evaluation buffers: one owned prediction/coefficient pair per
//! slot, with the residual and reconstruction scratch shared from the
//! context pool (the context guarantees no overlapping use).

use crate::candidate::ModeDecisionCandidate;
use crate::partition::{TxType, MAX_TXB_COUNT};
use arrayvec::ArrayVec;
use v_frame::pixel::{CastFromPrimitive, Pixel};
use v_frame::plane::{Plane, PlaneOffset};

/// Per-transform-unit results the RD stage fills in and the selector
/// commits.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TuRecord {
  /// Y / U / V coefficient-present flags.
  pub has_coeff: [bool; 3],
  pub tx_type: TxType,
  pub tx_type_uv: TxType,
  pub quantized_dc: [i32; 3],
}

/// One evaluation slot: the candidate under test plus its RD outputs.
#[derive(Debug)]
pub struct CandidateBuffer<T: Pixel> {
  pub candidate: ModeDecisionCandidate,
  pub prediction: Plane<T>,
  pub coeffs: Box<[i32]>,
  pub fast_cost: u64,
  pub full_cost: u64,
  pub default_cost: u64,
  pub total_rate: u32,
  pub distortion: u64,
  pub merge_cost: u64,
  pub skip_cost: u64,
  pub tx_depth: u8,
  pub skip_flag: bool,
  pub tu: ArrayVec<TuRecord, MAX_TXB_COUNT>,
}

impl<T: Pixel> CandidateBuffer<T> {
  /// Allocates the owned buffers for one slot; called once per slot at
  /// process init, never per block.
  pub fn new(sb_size: usize) -> Self {
    CandidateBuffer {
      candidate: ModeDecisionCandidate::default(),
      prediction: Plane::new(sb_size, sb_size, 0, 0, 0, 0),
      coeffs: vec![0i32; sb_size * sb_size].into_boxed_slice(),
      fast_cost: 0,
      full_cost: u64::MAX,
      default_cost: 0,
      total_rate: 0,
      distortion: 0,
      merge_cost: 0,
      skip_cost: 0,
      tx_depth: 0,
      skip_flag: false,
      tu: ArrayVec::new(),
    }
  }

  /// Reduction OR over the per-TU coefficient flags.
  pub fn block_has_coeff(&self) -> bool {
    self.tu.iter().any(|tu| tu.has_coeff.iter().any(|&c| c))
  }

  /// Clears RD outputs before the slot is reused for a new candidate.
  pub fn reset(&mut self) {
    self.fast_cost = 0;
    self.full_cost = u64::MAX;
    self.default_cost = 0;
    self.total_rate = 0;
    self.distortion = 0;
    self.merge_cost = 0;
    self.skip_cost = 0;
    self.tx_depth = 0;
    self.skip_flag = false;
    self.tu.clear();
  }
}

/// Context-scoped scratch shared across candidate evaluations.
#[derive(Debug)]
pub struct ScratchPool<T: Pixel> {
  pub residual: Box<[i16]>,
  pub recon: Plane<T>,
  /// Stride of the residual buffer.
  pub stride: usize,
}

impl<T: Pixel> ScratchPool<T> {
  pub fn new(sb_size: usize) -> Self {
    ScratchPool {
      residual: vec![0i16; sb_size * sb_size].into_boxed_slice(),
      recon: Plane::new(sb_size, sb_size, 0, 0, 0, 0),
      stride: sb_size,
    }
  }
}

/// `residual = src - pred` over one `w`x`h` block.
pub fn subtract_block<T: Pixel>(
  residual: &mut [i16], residual_stride: usize, src: &Plane<T>,
  src_off: PlaneOffset, pred: &Plane<T>, pred_off: PlaneOffset, w: usize,
  h: usize,
) {
  for y in 0..h {
    let src_row = src.row(src_off.y + y as isize);
    let pred_row = pred.row(pred_off.y + y as isize);
    let res_row = &mut residual[y * residual_stride..][..w];
    for x in 0..w {
      let s: i32 = i32::cast_from(src_row[src_off.x as usize + x]);
      let p: i32 = i32::cast_from(pred_row[pred_off.x as usize + x]);
      res_row[x] = (s - p) as i16;
    }
  }
}

/// `diff = a - b` over one block, both operands predictions.
pub fn diff_block<T: Pixel>(
  diff: &mut [i16], diff_stride: usize, a: &Plane<T>, a_off: PlaneOffset,
  b: &Plane<T>, b_off: PlaneOffset, w: usize, h: usize,
) {
  for y in 0..h {
    let a_row = a.row(a_off.y + y as isize);
    let b_row = b.row(b_off.y + y as isize);
    let d_row = &mut diff[y * diff_stride..][..w];
    for x in 0..w {
      let av: i32 = i32::cast_from(a_row[a_off.x as usize + x]);
      let bv: i32 = i32::cast_from(b_row[b_off.x as usize + x]);
      d_row[x] = (av - bv) as i16;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn plane_filled(w: usize, h: usize, f: impl Fn(usize, usize) -> u8) -> Plane<u8> {
    let mut p: Plane<u8> = Plane::new(w, h, 0, 0, 0, 0);
    let stride = p.cfg.stride;
    for y in 0..h {
      for x in 0..w {
        p.data_origin_mut()[y * stride + x] = f(x, y);
      }
    }
    p
  }

  #[test]
  fn subtract_produces_signed_residual() {
    let src = plane_filled(8, 8, |x, y| (16 + x + y) as u8);
    let pred = plane_filled(8, 8, |_, _| 20u8);
    let mut res = [0i16; 64];
    subtract_block(
      &mut res,
      8,
      &src,
      PlaneOffset { x: 0, y: 0 },
      &pred,
      PlaneOffset { x: 0, y: 0 },
      8,
      8,
    );
    assert_eq!(res[0], -4);
    assert_eq!(res[63], 10);
  }

  #[test]
  fn block_has_coeff_is_reduction_or() {
    let mut buf: CandidateBuffer<u8> = CandidateBuffer::new(64);
    assert!(!buf.block_has_coeff());
    buf.tu.push(TuRecord::default());
    assert!(!buf.block_has_coeff());
    buf.tu.push(TuRecord {
      has_coeff: [false, true, false],
      ..Default::default()
    });
    assert!(buf.block_has_coeff());
  }

  #[test]
  fn reset_clears_rd_outputs() {
    let mut buf: CandidateBuffer<u8> = CandidateBuffer::new(64);
    buf.full_cost = 10;
    buf.total_rate = 3;
    buf.tu.push(TuRecord::default());
    buf.reset();
    assert_eq!(buf.full_cost, u64::MAX);
    assert_eq!(buf.total_rate, 0);
    assert!(buf.tu.is_empty());
  }
}
