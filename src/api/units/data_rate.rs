/*
 *  Copyright (c) 2018 The WebRTC project authors. All Rights Reserved.
 *
 *  Use of this source code is governed by a BSD-style license
 *  that can be found in the LICENSE file in the root of the source
 *  tree. An additional intellectual property rights grant can be found
 *  in the file PATENTS.  All contributing project authors may
 *  be found in the AUTHORS file in the root of the source tree.
 */

// DataRate represents a given data rate, such as an encoder target bitrate or a
// measured link bandwidth. The internal storage is bits per second (bps).

use std::fmt;

super::relative_unit!(DataRate);

impl DataRate {
    const ONE_SIDED: bool = true;

    pub const fn from_bits_per_sec(value: i64) -> Self {
        Self::from_value(value)
    }

    pub fn from_bits_per_sec_float(value: f64) -> Self {
        Self::from_value_float(value)
    }

    pub const fn from_kilobits_per_sec(value: i64) -> Self {
        Self::from_fraction(1000, value)
    }

    pub const fn bps(&self) -> i64 {
        self.to_value()
    }

    pub fn bps_float(&self) -> f64 {
        self.to_value_float()
    }

    pub const fn kbps(&self) -> i64 {
        self.to_fraction(1000)
    }

    pub const fn bps_or(&self, fallback_value: i64) -> i64 {
        self.to_value_or(fallback_value)
    }
}

impl fmt::Debug for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_plus_infinity() {
            write!(f, "+inf bps")
        } else if self.is_minus_infinity() {
            write!(f, "-inf bps")
        } else if self.bps() == 0 || self.bps() % 1000 != 0 {
            write!(f, "{} bps", self.bps())
        } else {
            write!(f, "{} kbps", self.kbps())
        }
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
