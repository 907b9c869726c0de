/*
 *  Copyright (c) 2019 The WebRTC project authors. All Rights Reserved.
 *
 *  Use of this source code is governed by a BSD-style license
 *  that can be found in the LICENSE file in the root of the source
 *  tree. An additional intellectual property rights grant can be found
 *  in the file PATENTS.  All contributing project authors may
 *  be found in the AUTHORS file in the root of the source tree.
 */

use std::fmt;

super::relative_unit!(DataSize);

impl DataSize {
    const ONE_SIDED: bool = true;

    pub const fn from_bytes(value: i64) -> Self {
        Self::from_value(value)
    }

    pub const fn bytes(&self) -> i64 {
        self.to_value()
    }
}

impl fmt::Debug for DataSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_plus_infinity() {
            write!(f, "+inf bytes")
        } else if self.is_minus_infinity() {
            write!(f, "-inf bytes")
        } else {
            write!(f, "{} bytes", self.bytes())
        }
    }
}

impl fmt::Display for DataSize {
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
        const DATA_SIZE_ZERO: DataSize = DataSize::zero();
        const DATA_SIZE_INF: DataSize = DataSize::plus_infinity();
        assert!(DataSize::default() == DATA_SIZE_ZERO);
        assert!(DATA_SIZE_ZERO.is_zero());
        assert!(DATA_SIZE_INF.is_infinite());
        assert!(DATA_SIZE_INF > DATA_SIZE_ZERO);

        const DATA_SIZE: DataSize = DataSize::from_bytes(VALUE);
        assert!(DATA_SIZE.bytes() == VALUE);
    }

    #[test]
    fn math_operations() {
        let a = DataSize::from_bytes(450);
        let b = DataSize::from_bytes(267);
        assert_eq!((a + b).bytes(), 717);
        assert_eq!((a - b).bytes(), 183);
        assert_eq!((a * 2).bytes(), 900);
        assert!(a > b);
    }
}
