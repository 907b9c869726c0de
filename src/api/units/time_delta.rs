/*
 *  Copyright (c) 2018 The WebRTC project authors. All Rights Reserved.
 *
 *  Use of this source code is governed by a BSD-style license
 *  that can be found in the LICENSE file in the root of the source
 *  tree. An additional intellectual property rights grant can be found
 *  in the file PATENTS.  All contributing project authors may
 *  be found in the AUTHORS file in the root of the source tree.
 */

use std::fmt;
use std::time::Duration;

// TimeDelta represents the difference between two timestamps. Commonly this can
// be a duration. It can be constructed and converted to seconds (s),
// milliseconds (ms) and microseconds (us).
super::relative_unit!(TimeDelta);

impl TimeDelta {
    const ONE_SIDED: bool = false;

    pub const fn from_seconds(value: i64) -> Self {
        Self::from_fraction(1_000_000, value)
    }

    pub const fn from_millis(value: i64) -> Self {
        Self::from_fraction(1_000, value)
    }

    pub const fn from_micros(value: i64) -> Self {
        Self::from_value(value)
    }

    pub const fn seconds(&self) -> i64 {
        self.to_fraction(1_000_000)
    }

    pub const fn ms(&self) -> i64 {
        self.to_fraction(1_000)
    }

    pub const fn us(&self) -> i64 {
        self.to_value()
    }

    /// Converts to a [Duration] for timers. Negative and infinite deltas have no
    /// counterpart and yield `None`.
    pub fn to_duration(&self) -> Option<Duration> {
        if self.is_infinite() || self.0 < 0 {
            return None;
        }
        Some(Duration::from_micros(self.0 as u64))
    }
}

impl fmt::Debug for TimeDelta {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_plus_infinity() {
            write!(f, "+inf ms")
        } else if self.is_minus_infinity() {
            write!(f, "-inf ms")
        } else if self.us() == 0 || (self.us() % 1000) != 0 {
            write!(f, "{} us", self.us())
        } else if self.ms() % 1000 != 0 {
            write!(f, "{} ms", self.ms())
        } else {
            write!(f, "{} s", self.seconds())
        }
    }
}

impl fmt::Display for TimeDelta {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
