// Placement search: corner bias, strided sweep, local refinement, fallback.

use super::integral::IntegralMask;
use super::masks::ContentMasks;
use super::options::ScaledParams;
use super::{LocatorError, LocatorResult, Placement, PlacementQuality};

#[derive(Debug, Clone, Copy)]
struct Candidate {
    x: u32,
    y: u32,
    overlap: f64,
}

/// Search the union mask for the largest square clearing the thresholds.
///
/// Sizes are tried largest-first; the first size with an acceptable
/// candidate wins. When none is acceptable the best fallback (largest size
/// within the fallback ceiling, ties by lower overlap) is returned, and when
/// even that fails the minimum-overlap candidate is returned as degraded.
/// The only error left is a page that cannot fit any size inside its
/// margins.
pub(crate) fn find_placement_scaled(
    content: &ContentMasks,
    params: &ScaledParams,
) -> LocatorResult<Placement> {
    let width = content.width();
    let height = content.height();
    let margin = params.margin;

    let usable: Vec<u32> = params
        .sizes
        .iter()
        .copied()
        .filter(|&s| fits(width, height, s, margin))
        .collect();
    if usable.is_empty() {
        return Err(LocatorError::PageTooSmall {
            width,
            height,
            min_size: params.sizes.iter().copied().min().unwrap_or(0),
            margin,
        });
    }

    let integral = content.union_integral();

    let mut per_size_best: Vec<(u32, Candidate)> = Vec::with_capacity(usable.len());
    for &size in &usable {
        let best = best_for_size(&integral, width, height, size, params);
        if best.overlap <= params.acceptable_overlap {
            return Ok(Placement {
                x: best.x,
                y: best.y,
                size,
                overlap_fraction: best.overlap,
                quality: PlacementQuality::Acceptable,
            });
        }
        per_size_best.push((size, best));
    }

    // No size reached the acceptable threshold. Prefer the largest size
    // within the fallback ceiling, ties broken by lower overlap.
    let fallback = per_size_best
        .iter()
        .filter(|(_, c)| c.overlap <= params.fallback_overlap)
        .max_by(|(sa, ca), (sb, cb)| {
            sa.cmp(sb).then(cb.overlap.total_cmp(&ca.overlap))
        });
    if let Some(&(size, c)) = fallback {
        return Ok(Placement {
            x: c.x,
            y: c.y,
            size,
            overlap_fraction: c.overlap,
            quality: PlacementQuality::Fallback,
        });
    }

    // Degraded page: hand back the least-bad candidate, never refuse.
    let &(size, c) = per_size_best
        .iter()
        .min_by(|(sa, ca), (sb, cb)| {
            ca.overlap.total_cmp(&cb.overlap).then(sb.cmp(sa))
        })
        .expect("at least one usable size");
    Ok(Placement {
        x: c.x,
        y: c.y,
        size,
        overlap_fraction: c.overlap,
        quality: PlacementQuality::Degraded,
    })
}

fn fits(width: u32, height: u32, size: u32, margin: u32) -> bool {
    size + 2 * margin <= width && size + 2 * margin <= height
}

/// Best candidate for one size: corners first (top-right, top-left,
/// bottom-right, bottom-left), then a strided sweep refined locally with
/// step 1. Later positions replace the incumbent only on strictly lower
/// overlap, so corner candidates win all near-ties.
fn best_for_size(
    integral: &IntegralMask,
    width: u32,
    height: u32,
    size: u32,
    params: &ScaledParams,
) -> Candidate {
    let margin = params.margin;
    let x_max = width - margin - size;
    let y_max = height - margin - size;

    let mut best = Candidate {
        x: margin,
        y: margin,
        overlap: f64::INFINITY,
    };

    if params.prefer_corners {
        let corners = [
            (x_max, margin),  // top-right
            (margin, margin), // top-left
            (x_max, y_max),   // bottom-right
            (margin, y_max),  // bottom-left
        ];
        for (cx, cy) in corners {
            let overlap = integral.overlap_fraction(cx, cy, size);
            if overlap < best.overlap {
                best = Candidate { x: cx, y: cy, overlap };
            }
            if overlap <= params.acceptable_overlap {
                // An acceptable corner short-circuits the whole sweep.
                return best;
            }
        }
    }

    let step = params.step_floor.max(size / 16);
    let xs = strided(margin, x_max, step);
    let ys = strided(margin, y_max, step);
    for &y in &ys {
        for &x in &xs {
            let overlap = integral.overlap_fraction(x, y, size);
            if overlap < best.overlap {
                best = Candidate { x, y, overlap };
                if overlap == 0.0 {
                    return best;
                }
            }
        }
    }

    refine(integral, best, size, step, margin, x_max, y_max)
}

/// Step-1 sweep of the ±step window around the best strided candidate.
fn refine(
    integral: &IntegralMask,
    mut best: Candidate,
    size: u32,
    step: u32,
    margin: u32,
    x_max: u32,
    y_max: u32,
) -> Candidate {
    let x_lo = best.x.saturating_sub(step).max(margin);
    let x_hi = (best.x + step).min(x_max);
    let y_lo = best.y.saturating_sub(step).max(margin);
    let y_hi = (best.y + step).min(y_max);
    for y in y_lo..=y_hi {
        for x in x_lo..=x_hi {
            let overlap = integral.overlap_fraction(x, y, size);
            if overlap < best.overlap {
                best = Candidate { x, y, overlap };
            }
        }
    }
    best
}

/// Strided positions over `[lo, hi]`, always including both endpoints.
fn strided(lo: u32, hi: u32, step: u32) -> Vec<u32> {
    let step = step.max(1) as usize;
    let mut positions: Vec<u32> = (lo..=hi).step_by(step).collect();
    if positions.last() != Some(&hi) {
        positions.push(hi);
    }
    positions
}
