use rand::Rng;
use shoal_config::SchoolConfig;

/// One colour per fish id.
///
/// The first `colorful_count` fish each take a palette colour, drawn at
/// random without replacement, so no two share one. Everyone else, and
/// anyone left over once the palette runs dry, wears `base_color`.
pub fn assign_colors<R: Rng>(school: &SchoolConfig, rng: &mut R) -> Vec<u32> {
    let mut pool = school.palette.clone();
    (0..school.fish_count)
        .map(|id| {
            if id < school.colorful_count && !pool.is_empty() {
                let pick = rng.gen_range(0..pool.len());
                pool.remove(pick)
            } else {
                school.base_color
            }
        })
        .collect()
}
