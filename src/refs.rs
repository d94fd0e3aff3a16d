// Copyright (c) 2017-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

#![allow(non_camel_case_types)]

use self::RefType::*;
use arrayvec::ArrayVec;
use itertools::Itertools;

// LAST_FRAME through ALTREF_FRAME correspond to slots 0-6.
#[derive(PartialEq, Eq, PartialOrd, Copy, Clone, Debug)]
pub enum RefType {
  INTRA_FRAME = 0,
  LAST_FRAME = 1,
  LAST2_FRAME = 2,
  LAST3_FRAME = 3,
  GOLDEN_FRAME = 4,
  BWDREF_FRAME = 5,
  ALTREF2_FRAME = 6,
  ALTREF_FRAME = 7,
  NONE_FRAME = 8,
}

pub const FWD_REFS: usize = 4;
pub const BWD_REFS: usize = 3;
pub const SINGLE_REFS: usize = 7;
pub const TOTAL_REFS_PER_FRAME: usize = 8;
pub const INTER_REFS_PER_FRAME: usize = 7;
pub const REFS_PER_LIST: usize = 4;

pub const TOTAL_UNIDIR_COMP_REFS: usize = 9;
pub const TOTAL_COMP_REFS: usize =
  FWD_REFS * BWD_REFS + TOTAL_UNIDIR_COMP_REFS;

/// Number of distinct (rf0, rf1) contexts the ref-MV stacks are indexed
/// by: the 8 single/intra slots plus every compound pair.
pub const MODE_CTX_REF_FRAMES: usize = TOTAL_REFS_PER_FRAME + TOTAL_COMP_REFS;

pub const ALL_INTER_REFS: [RefType; INTER_REFS_PER_FRAME] = [
  LAST_FRAME,
  LAST2_FRAME,
  LAST3_FRAME,
  GOLDEN_FRAME,
  BWDREF_FRAME,
  ALTREF2_FRAME,
  ALTREF_FRAME,
];

impl RefType {
  /// convert to a ref list index, 0-6 (`INTER_REFS_PER_FRAME`)
  ///
  /// # Panics
  ///
  /// - If the ref type is a None or Intra frame
  #[inline]
  pub fn to_index(self) -> usize {
    match self {
      NONE_FRAME => {
        panic!("Tried to get slot of NONE_FRAME");
      }
      INTRA_FRAME => {
        panic!("Tried to get slot of INTRA_FRAME");
      }
      _ => (self as usize) - 1,
    }
  }

  #[inline]
  pub const fn is_fwd_ref(self) -> bool {
    (self as usize) >= 1 && (self as usize) < 5
  }

  #[inline]
  pub const fn is_bwd_ref(self) -> bool {
    (self as usize) >= 5 && (self as usize) < 8
  }

  #[inline]
  pub const fn is_inter_ref(self) -> bool {
    self.is_fwd_ref() || self.is_bwd_ref()
  }

  /// Prediction list this reference is reached through: 0 for the forward
  /// refs, 1 for the backward refs.
  ///
  /// # Panics
  ///
  /// - If the ref type is not an inter reference
  #[inline]
  pub fn list(self) -> usize {
    assert!(self.is_inter_ref());
    usize::from(self.is_bwd_ref())
  }

  /// Index of this reference within its prediction list.
  ///
  /// # Panics
  ///
  /// - If the ref type is not an inter reference
  #[inline]
  pub fn ref_idx(self) -> usize {
    assert!(self.is_inter_ref());
    if self.is_fwd_ref() {
      self as usize - LAST_FRAME as usize
    } else {
      self as usize - BWDREF_FRAME as usize
    }
  }

  /// Inverse of [`RefType::list`] / [`RefType::ref_idx`].
  ///
  /// # Panics
  ///
  /// - If `(list, ref_idx)` names no reference
  #[inline]
  pub fn from_list_idx(list: usize, ref_idx: usize) -> RefType {
    match (list, ref_idx) {
      (0, 0) => LAST_FRAME,
      (0, 1) => LAST2_FRAME,
      (0, 2) => LAST3_FRAME,
      (0, 3) => GOLDEN_FRAME,
      (1, 0) => BWDREF_FRAME,
      (1, 1) => ALTREF2_FRAME,
      (1, 2) => ALTREF_FRAME,
      _ => panic!("no reference for list {list} idx {ref_idx}"),
    }
  }

  #[inline]
  fn from_u8(v: u8) -> RefType {
    match v {
      0 => INTRA_FRAME,
      1 => LAST_FRAME,
      2 => LAST2_FRAME,
      3 => LAST3_FRAME,
      4 => GOLDEN_FRAME,
      5 => BWDREF_FRAME,
      6 => ALTREF2_FRAME,
      7 => ALTREF_FRAME,
      _ => NONE_FRAME,
    }
  }
}

/// Every compound pair in stack-context order: the bidirectional pairs
/// first (fwd-major), then the unidirectional pairs.
pub const COMP_REF_PAIRS: [[RefType; 2]; TOTAL_COMP_REFS] = [
  [LAST_FRAME, BWDREF_FRAME],
  [LAST_FRAME, ALTREF2_FRAME],
  [LAST_FRAME, ALTREF_FRAME],
  [LAST2_FRAME, BWDREF_FRAME],
  [LAST2_FRAME, ALTREF2_FRAME],
  [LAST2_FRAME, ALTREF_FRAME],
  [LAST3_FRAME, BWDREF_FRAME],
  [LAST3_FRAME, ALTREF2_FRAME],
  [LAST3_FRAME, ALTREF_FRAME],
  [GOLDEN_FRAME, BWDREF_FRAME],
  [GOLDEN_FRAME, ALTREF2_FRAME],
  [GOLDEN_FRAME, ALTREF_FRAME],
  [LAST_FRAME, LAST2_FRAME],
  [LAST_FRAME, LAST3_FRAME],
  [LAST_FRAME, GOLDEN_FRAME],
  [BWDREF_FRAME, ALTREF_FRAME],
  [LAST2_FRAME, LAST3_FRAME],
  [LAST2_FRAME, GOLDEN_FRAME],
  [LAST3_FRAME, GOLDEN_FRAME],
  [BWDREF_FRAME, ALTREF2_FRAME],
  [ALTREF2_FRAME, ALTREF_FRAME],
];

/// An ordered reference pair. `rf1 == NONE_FRAME` denotes uni-prediction;
/// intra candidates use `(INTRA_FRAME, NONE_FRAME)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefFrames(pub [RefType; 2]);

impl Default for RefFrames {
  fn default() -> Self {
    RefFrames([INTRA_FRAME, NONE_FRAME])
  }
}

impl RefFrames {
  pub const INTRA: RefFrames = RefFrames([INTRA_FRAME, NONE_FRAME]);

  #[inline]
  pub const fn single(rf: RefType) -> Self {
    RefFrames([rf, NONE_FRAME])
  }

  #[inline]
  pub const fn pair(rf0: RefType, rf1: RefType) -> Self {
    RefFrames([rf0, rf1])
  }

  #[inline]
  pub const fn rf0(self) -> RefType {
    self.0[0]
  }

  #[inline]
  pub const fn rf1(self) -> RefType {
    self.0[1]
  }

  #[inline]
  pub fn is_compound(self) -> bool {
    self.0[1].is_inter_ref()
  }

  #[inline]
  pub fn is_intra(self) -> bool {
    self.0[0] == INTRA_FRAME
  }

  /// Reference reached through prediction list `list`; `None` for the
  /// unused side of a uni-pred pair.
  #[inline]
  pub fn ref_in_list(self, list: usize) -> Option<RefType> {
    if self.is_compound() {
      Some(self.0[list])
    } else if self.0[0].is_inter_ref() && self.0[0].list() == list {
      Some(self.0[0])
    } else {
      None
    }
  }

  /// Packed `ref_frame_type`, the dedup-registry and block-record key.
  #[inline]
  pub const fn packed(self) -> u8 {
    (self.0[0] as u8) | ((self.0[1] as u8) << 4)
  }

  /// Inverse of [`RefFrames::packed`].
  #[inline]
  pub fn unpack(packed: u8) -> Self {
    RefFrames([RefType::from_u8(packed & 0xf), RefType::from_u8(packed >> 4)])
  }

  /// Dense index for the per-pair ref-MV stacks: single/intra slots 0-7,
  /// compound pairs following in `COMP_REF_PAIRS` order.
  ///
  /// # Panics
  ///
  /// - If the pair is not a legal stack context
  pub fn mode_ctx_index(self) -> usize {
    if !self.is_compound() {
      return self.0[0] as usize;
    }
    for (i, pair) in COMP_REF_PAIRS.iter().enumerate() {
      if pair[0] == self.0[0] && pair[1] == self.0[1] {
        return TOTAL_REFS_PER_FRAME + i;
      }
    }
    panic!("{:?} is not a legal compound pair", self);
  }
}

/// Uni-pred references available under the frame's per-list ref counts.
pub fn available_uni_refs(
  ref_list0_count: usize, ref_list1_count: usize,
) -> ArrayVec<RefType, INTER_REFS_PER_FRAME> {
  let mut out = ArrayVec::new();
  for idx in 0..ref_list0_count.min(FWD_REFS) {
    out.push(RefType::from_list_idx(0, idx));
  }
  for idx in 0..ref_list1_count.min(BWD_REFS) {
    out.push(RefType::from_list_idx(1, idx));
  }
  out
}

/// Bidirectional pairs available under the frame's per-list ref counts,
/// fwd-major as in `COMP_REF_PAIRS`.
pub fn available_bi_refs(
  ref_list0_count: usize, ref_list1_count: usize,
) -> ArrayVec<RefFrames, { FWD_REFS * BWD_REFS }> {
  (0..ref_list0_count.min(FWD_REFS))
    .cartesian_product(0..ref_list1_count.min(BWD_REFS))
    .map(|(i0, i1)| {
      RefFrames::pair(
        RefType::from_list_idx(0, i0),
        RefType::from_list_idx(1, i1),
      )
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn list_idx_round_trip() {
    for rf in ALL_INTER_REFS {
      assert_eq!(RefType::from_list_idx(rf.list(), rf.ref_idx()), rf);
    }
  }

  #[test]
  fn packed_round_trip() {
    for rf in ALL_INTER_REFS {
      let pair = RefFrames::single(rf);
      assert_eq!(RefFrames::unpack(pair.packed()), pair);
    }
    for pair in COMP_REF_PAIRS {
      let rf = RefFrames(pair);
      assert_eq!(RefFrames::unpack(rf.packed()), rf);
    }
    assert_eq!(RefFrames::unpack(RefFrames::INTRA.packed()), RefFrames::INTRA);
  }

  #[test]
  fn mode_ctx_indices_are_dense_and_distinct() {
    let mut seen = [false; MODE_CTX_REF_FRAMES];
    for rf in ALL_INTER_REFS {
      let i = RefFrames::single(rf).mode_ctx_index();
      assert!(!seen[i]);
      seen[i] = true;
    }
    for pair in COMP_REF_PAIRS {
      let i = RefFrames(pair).mode_ctx_index();
      assert!(!seen[i]);
      seen[i] = true;
    }
    assert!(!seen[RefFrames::INTRA.mode_ctx_index()]);
  }

  #[test]
  fn available_refs_respect_list_counts() {
    let uni = available_uni_refs(1, 1);
    assert_eq!(uni.as_slice(), &[RefType::LAST_FRAME, RefType::BWDREF_FRAME]);
    let bi = available_bi_refs(2, 1);
    assert_eq!(bi.len(), 2);
    assert!(bi.iter().all(|rf| rf.is_compound()));
    assert!(available_bi_refs(4, 0).is_empty());
  }

  #[test]
  fn ref_in_list_sides() {
    let uni = RefFrames::single(RefType::BWDREF_FRAME);
    assert_eq!(uni.ref_in_list(0), None);
    assert_eq!(uni.ref_in_list(1), Some(RefType::BWDREF_FRAME));
    let bi = RefFrames::pair(RefType::LAST_FRAME, RefType::ALTREF_FRAME);
    assert_eq!(bi.ref_in_list(0), Some(RefType::LAST_FRAME));
    assert_eq!(bi.ref_in_list(1), Some(RefType::ALTREF_FRAME));
  }
}
