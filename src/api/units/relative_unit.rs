/*
 *  Copyright (c) 2018 The WebRTC project authors. All Rights Reserved.
 *
 *  Use of this source code is governed by a BSD-style license
 *  that can be found in the LICENSE file in the root of the source
 *  tree. An additional intellectual property rights grant can be found
 *  in the file PATENTS.  All contributing project authors may
 *  be found in the AUTHORS file in the root of the source tree.
 */

// A unit whose values can be added, subtracted and scaled. Infinities are
// absorbing; mixing opposite infinities is a programming error.
macro_rules! relative_unit {
    ($ty:ident) => {
        crate::api::units::unit_base!($ty);

        impl $ty {
            pub fn clamped(&self, min_value: Self, max_value: Self) -> Self {
                Self(self.0.max(min_value.0).min(max_value.0))
            }
        }

        impl ::std::ops::Add for $ty {
            type Output = Self;

            fn add(self, rhs: Self) -> Self::Output {
                if self.is_plus_infinity() || rhs.is_plus_infinity() {
                    assert!(!self.is_minus_infinity());
                    assert!(!rhs.is_minus_infinity());
                    return Self::plus_infinity();
                } else if self.is_minus_infinity() || rhs.is_minus_infinity() {
                    assert!(!self.is_plus_infinity());
                    assert!(!rhs.is_plus_infinity());
                    return Self::minus_infinity();
                }
                Self(self.0 + rhs.0)
            }
        }

        impl ::std::ops::Sub for $ty {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self::Output {
                if self.is_plus_infinity() || rhs.is_minus_infinity() {
                    assert!(!self.is_minus_infinity());
                    assert!(!rhs.is_plus_infinity());
                    return Self::plus_infinity();
                } else if self.is_minus_infinity() || rhs.is_plus_infinity() {
                    assert!(!self.is_plus_infinity());
                    assert!(!rhs.is_minus_infinity());
                    return Self::minus_infinity();
                }
                Self(self.0 - rhs.0)
            }
        }

        impl ::std::ops::AddAssign for $ty {
            fn add_assign(&mut self, rhs: Self) {
                *self = *self + rhs;
            }
        }

        impl ::std::ops::SubAssign for $ty {
            fn sub_assign(&mut self, rhs: Self) {
                *self = *self - rhs;
            }
        }

        impl ::std::ops::Div for $ty {
            type Output = f64;

            fn div(self, rhs: Self) -> Self::Output {
                self.to_value_float() / rhs.to_value_float()
            }
        }

        impl ::std::ops::Div<i64> for $ty {
            type Output = Self;

            fn div(self, rhs: i64) -> Self::Output {
                Self::from_value(self.to_value() / rhs)
            }
        }

        impl ::std::ops::Mul<f64> for $ty {
            type Output = Self;

            fn mul(self, rhs: f64) -> Self::Output {
                Self::from_value_float(self.to_value_float() * rhs)
            }
        }

        impl ::std::ops::Mul<$ty> for f64 {
            type Output = $ty;

            fn mul(self, rhs: $ty) -> Self::Output {
                rhs * self
            }
        }

        impl ::std::ops::Mul<i64> for $ty {
            type Output = Self;

            fn mul(self, rhs: i64) -> Self::Output {
                Self::from_value(self.to_value() * rhs)
            }
        }
    };
}

pub(crate) use relative_unit;
