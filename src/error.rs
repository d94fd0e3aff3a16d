// Copyright (c) 2018-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use thiserror::Error;

/// Failures surfaced to the caller of the mode-decision entry points.
///
/// Per-candidate oracle failures (warped fit invalid, masked-compound fit
/// rejected, empty palette) are absorbed silently by the injectors and
/// never reach this type; the candidate simply is not injected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MdError {
  /// The caller handed us a block geometry that cannot be represented
  /// (zero-sized, or not a legal AV1 block size).
  #[error("invalid block geometry {width}x{height}")]
  InvalidBlockGeometry { width: usize, height: usize },
  /// The fast candidate array filled up and injection was truncated.
  /// The surviving prefix is still usable; callers treat this as fatal.
  #[error("candidate capacity exhausted after {injected} candidates")]
  CandidateCapacity { injected: usize },
}
