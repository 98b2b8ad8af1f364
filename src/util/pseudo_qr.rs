//! Deterministic QR-looking grid for the simulated payment screen.
//!
//! This is not a real QR code and encodes nothing a scanner can read. The
//! pattern is derived from a SHA-256 hash of the payment reference so that the
//! same attempt always shows the same picture. No payment provider is involved.

use sha2::{Digest, Sha256};

pub const GRID_SIZE: usize = 25;
const FINDER_SIZE: usize = 7;
const MODULE_PX: usize = 8;
const QUIET_ZONE: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PseudoQr {
    modules: Vec<bool>,
}

impl PseudoQr {
    pub fn for_reference(reference: &str) -> Self {
        let bits = hash_bits(reference, GRID_SIZE * GRID_SIZE);
        let mut modules = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                let dark = match finder_cell(row, col) {
                    Some(dark) => dark,
                    None => bits[row * GRID_SIZE + col],
                };
                modules.push(dark);
            }
        }
        Self { modules }
    }

    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        row < GRID_SIZE && col < GRID_SIZE && self.modules[row * GRID_SIZE + col]
    }

    pub fn to_svg(&self) -> String {
        let side = (GRID_SIZE + QUIET_ZONE * 2) * MODULE_PX;
        let mut svg = format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {side} {side}" width="{side}" height="{side}" shape-rendering="crispEdges"><rect width="{side}" height="{side}" fill="#ffffff"/>"##
        );
        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                if self.is_dark(row, col) {
                    let x = (col + QUIET_ZONE) * MODULE_PX;
                    let y = (row + QUIET_ZONE) * MODULE_PX;
                    svg.push_str(&format!(
                        r##"<rect x="{x}" y="{y}" width="{MODULE_PX}" height="{MODULE_PX}" fill="#1b3a1f"/>"##
                    ));
                }
            }
        }
        svg.push_str("</svg>");
        svg
    }
}

/// Chains SHA-256 rounds until enough bits are available.
fn hash_bits(reference: &str, count: usize) -> Vec<bool> {
    let mut bits = Vec::with_capacity(count);
    let mut block = Sha256::digest(reference.as_bytes());
    let mut round: u32 = 0;
    while bits.len() < count {
        for byte in block.iter() {
            for shift in (0..8).rev() {
                bits.push((byte >> shift) & 1 == 1);
            }
        }
        round += 1;
        let mut hasher = Sha256::new();
        hasher.update(block);
        hasher.update(round.to_be_bytes());
        block = hasher.finalize();
    }
    bits.truncate(count);
    bits
}

/// Position markers in three corners, with a light separator ring.
fn finder_cell(row: usize, col: usize) -> Option<bool> {
    let origins = [
        (0, 0),
        (0, GRID_SIZE - FINDER_SIZE),
        (GRID_SIZE - FINDER_SIZE, 0),
    ];
    for (top, left) in origins {
        let within = |value: usize, start: usize| {
            value + 1 >= start && value <= start + FINDER_SIZE
        };
        if !(within(row, top) && within(col, left)) {
            continue;
        }
        let (r, c) = (row as isize - top as isize, col as isize - left as isize);
        let size = FINDER_SIZE as isize;
        if r < 0 || c < 0 || r >= size || c >= size {
            return Some(false);
        }
        let ring = r.min(c).min(size - 1 - r).min(size - 1 - c);
        return Some(ring != 1);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_reference_draws_same_grid() {
        let a = PseudoQr::for_reference("HARV-e1-abc");
        let b = PseudoQr::for_reference("HARV-e1-abc");
        assert_eq!(a, b);
        assert_eq!(a.to_svg(), b.to_svg());
    }

    #[test]
    fn different_references_differ() {
        assert_ne!(
            PseudoQr::for_reference("HARV-e1-abc"),
            PseudoQr::for_reference("HARV-e1-abd")
        );
    }

    #[test]
    fn corners_carry_finder_patterns() {
        let qr = PseudoQr::for_reference("anything");
        for (top, left) in [(0, 0), (0, GRID_SIZE - 7), (GRID_SIZE - 7, 0)] {
            assert!(qr.is_dark(top, left));
            assert!(!qr.is_dark(top + 1, left + 1));
            assert!(qr.is_dark(top + 3, left + 3));
        }
        assert!(!qr.is_dark(7, 7));
        assert!(!qr.is_dark(GRID_SIZE, 0));
    }

    #[test]
    fn svg_is_sized_to_grid_and_quiet_zone() {
        let svg = PseudoQr::for_reference("ref").to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"viewBox="0 0 232 232""#));
        assert!(svg.ends_with("</svg>"));
    }
}
