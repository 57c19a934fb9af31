//! Horizontal differencing predictor
//!
//! Operates element-wise on typed rows: each row of `width` elements is
//! differenced right-to-left and restored left-to-right, independently of
//! the other rows. Integer types wrap; 32-bit floats are differenced as
//! wrapping differences of their bit patterns, so the round trip is exact.

/// Element types the predictor can difference
pub trait Differencing: Copy {
    fn delta(self, previous: Self) -> Self;
    fn accumulate(self, previous: Self) -> Self;
}

macro_rules! wrapping_differencing {
    ($($t:ty),*) => {
        $(
            impl Differencing for $t {
                fn delta(self, previous: Self) -> Self {
                    self.wrapping_sub(previous)
                }

                fn accumulate(self, previous: Self) -> Self {
                    self.wrapping_add(previous)
                }
            }
        )*
    };
}

wrapping_differencing!(u8, u16, u32);

impl Differencing for f32 {
    fn delta(self, previous: Self) -> Self {
        f32::from_bits(self.to_bits().wrapping_sub(previous.to_bits()))
    }

    fn accumulate(self, previous: Self) -> Self {
        f32::from_bits(self.to_bits().wrapping_add(previous.to_bits()))
    }
}

/// Replaces every row with its horizontal differences
pub fn apply_horizontal_differencing<T: Differencing>(data: &mut [T], width: usize) {
    if width < 2 {
        return;
    }

    for row in data.chunks_mut(width) {
        for x in (1..row.len()).rev() {
            row[x] = row[x].delta(row[x - 1]);
        }
    }
}

/// Restores rows previously passed through `apply_horizontal_differencing`
pub fn reverse_horizontal_differencing<T: Differencing>(data: &mut [T], width: usize) {
    if width < 2 {
        return;
    }

    for row in data.chunks_mut(width) {
        for x in 0..row.len().saturating_sub(1) {
            row[x + 1] = row[x + 1].accumulate(row[x]);
        }
    }
}
