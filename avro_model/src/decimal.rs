// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};

/// Brings `value` to `scale` and returns its unscaled integer.
///
/// Fails when the value has more fractional digits than `scale` or more digits than
/// `precision` once scaled.
pub(crate) fn unscaled(value: &BigDecimal, precision: u32, scale: u32) -> Result<BigInt, String> {
    let scaled = value.with_scale(i64::from(scale));
    if &scaled != value {
        return Err(format!(
            "{value} has more than {scale} digits after the decimal point"
        ));
    }
    let (unscaled, _) = scaled.as_bigint_and_exponent();
    let digits = unscaled.magnitude().to_string().len();
    if digits > precision as usize {
        return Err(format!(
            "{value} needs {digits} digits, the precision is {precision}"
        ));
    }
    Ok(unscaled)
}

/// The minimal two's-complement big-endian bytes of `value`.
pub(crate) fn to_bytes(value: &BigInt) -> Vec<u8> {
    value.to_signed_bytes_be()
}

/// The two's-complement big-endian bytes of `value`, sign extended to `len` bytes.
pub(crate) fn to_sign_extended_bytes(value: &BigInt, len: usize) -> Result<Vec<u8>, String> {
    let sign_byte = 0xFF * u8::from(value.sign() == Sign::Minus);
    let mut decimal_bytes = vec![sign_byte; len];
    let raw_bytes = value.to_signed_bytes_be();
    let num_raw_bytes = raw_bytes.len();
    let start_byte_index = len.checked_sub(num_raw_bytes).ok_or_else(|| {
        format!("decimal needs {num_raw_bytes} bytes, the fixed size is {len}")
    })?;
    decimal_bytes[start_byte_index..].copy_from_slice(&raw_bytes);
    Ok(decimal_bytes)
}

/// Reads two's-complement big-endian bytes written with `scale`.
pub(crate) fn from_bytes(bytes: &[u8], scale: u32) -> BigDecimal {
    BigDecimal::new(BigInt::from_signed_bytes_be(bytes), i64::from(scale))
}

/// The largest precision a fixed of `size` bytes can hold.
pub(crate) fn max_precision_for_fixed(size: usize) -> u32 {
    if size == 0 {
        return 0;
    }
    // floor(log10(2^(8 * size - 1) - 1))
    let bits = 8.0 * size as f64 - 1.0;
    (bits * 2f64.log10()).floor() as u32
}
