/*
 *  Copyright (c) 2018 The WebRTC project authors. All Rights Reserved.
 *
 *  Use of this source code is governed by a BSD-style license
 *  that can be found in the LICENSE file in the root of the source
 *  tree. An additional intellectual property rights grant can be found
 *  in the file PATENTS.  All contributing project authors may
 *  be found in the AUTHORS file in the root of the source tree.
 */

//! Timestamp represents the time that has passed since some unspecified epoch.
//! The epoch is assumed to be before any represented timestamps, this means that
//! negative values are not valid. The difference of two Timestamps results in a
//! TimeDelta.
super::unit_base!(Timestamp);

use std::fmt;
use std::ops::*;

use super::TimeDelta;

impl Timestamp {
    const ONE_SIDED: bool = true;

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
}

impl Add<TimeDelta> for Timestamp {
    type Output = Self;

    fn add(self, delta: TimeDelta) -> Self {
        if self.is_plus_infinity() || delta.is_plus_infinity() {
            assert!(!self.is_minus_infinity());
            assert!(!delta.is_minus_infinity());
            return Self::plus_infinity();
        } else if self.is_minus_infinity() || delta.is_minus_infinity() {
            assert!(!self.is_plus_infinity());
            assert!(!delta.is_plus_infinity());
            return Self::minus_infinity();
        }
        Timestamp::from_micros(self.us() + delta.us())
    }
}

impl Sub<TimeDelta> for Timestamp {
    type Output = Self;

    fn sub(self, delta: TimeDelta) -> Self {
        if self.is_plus_infinity() || delta.is_minus_infinity() {
            assert!(!self.is_minus_infinity());
            assert!(!delta.is_plus_infinity());
            return Self::plus_infinity();
        } else if self.is_minus_infinity() || delta.is_plus_infinity() {
            assert!(!self.is_plus_infinity());
            assert!(!delta.is_minus_infinity());
            return Self::minus_infinity();
        }
        Timestamp::from_micros(self.us() - delta.us())
    }
}

impl Sub for Timestamp {
    type Output = TimeDelta;

    fn sub(self, other: Self) -> TimeDelta {
        if self.is_plus_infinity() || other.is_minus_infinity() {
            assert!(!self.is_minus_infinity());
            assert!(!other.is_plus_infinity());
            return TimeDelta::plus_infinity();
        } else if self.is_minus_infinity() || other.is_plus_infinity() {
            assert!(!self.is_plus_infinity());
            assert!(!other.is_minus_infinity());
            return TimeDelta::minus_infinity();
        }
        TimeDelta::from_micros(self.us() - other.us())
    }
}

impl AddAssign<TimeDelta> for Timestamp {
    fn add_assign(&mut self, delta: TimeDelta) {
        *self = *self + delta;
    }
}

impl SubAssign<TimeDelta> for Timestamp {
    fn sub_assign(&mut self, delta: TimeDelta) {
        *self = *self - delta;
    }
}

impl fmt::Debug for Timestamp {
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

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn const_expr() {
        const VALUE: i64 = 12345;
        const TIMESTAMP_INF: Timestamp = Timestamp::plus_infinity();
        assert!(TIMESTAMP_INF.is_infinite());

        const TIMESTAMP_MS: Timestamp = Timestamp::from_millis(VALUE);
        const TIMESTAMP_US: Timestamp = Timestamp::from_micros(VALUE);
        assert!(TIMESTAMP_MS.ms() == VALUE);
        assert!(TIMESTAMP_US.us() == VALUE);
        assert!(TIMESTAMP_MS > TIMESTAMP_US);
    }

    #[test]
    fn get_back_same_values() {
        const VALUE: i64 = 499;
        assert_eq!(Timestamp::from_millis(VALUE).ms(), VALUE);
        assert_eq!(Timestamp::from_micros(VALUE).us(), VALUE);
        assert_eq!(Timestamp::from_millis(VALUE * 1000).seconds(), VALUE);
    }

    #[test]
    fn infinity_operations() {
        const VALUE: i64 = 267;
        let finite_time = Timestamp::from_millis(VALUE);
        let finite_delta = TimeDelta::from_millis(VALUE);
        assert!((Timestamp::plus_infinity() + finite_delta).is_infinite());
        assert!((Timestamp::plus_infinity() - finite_delta).is_infinite());
        assert!((finite_time + TimeDelta::plus_infinity()).is_infinite());
        assert!((finite_time - TimeDelta::minus_infinity()).is_infinite());
    }

    #[test]
    fn math_operations() {
        const VALUE_A: i64 = 267;
        const VALUE_B: i64 = 450;
        let time_a = Timestamp::from_millis(VALUE_A);
        let time_b = Timestamp::from_millis(VALUE_B);
        assert_eq!((time_a - time_b).ms(), VALUE_A - VALUE_B);

        let delta_b = TimeDelta::from_millis(VALUE_B);
        assert_eq!((time_a + delta_b).ms(), VALUE_A + VALUE_B);
        assert_eq!((time_b - TimeDelta::from_millis(VALUE_A)).ms(), VALUE_B - VALUE_A);

        let mut mutable_time = time_a;
        mutable_time += delta_b;
        assert_eq!(mutable_time, time_a + delta_b);
        mutable_time -= delta_b;
        assert_eq!(mutable_time, time_a);
    }
}
