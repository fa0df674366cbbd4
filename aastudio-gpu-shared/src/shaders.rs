/// Embedded WGSL shader sources.
/// Every full-screen fragment module pairs with `FULLSCREEN_QUAD_VERT`.

pub const FULLSCREEN_QUAD_VERT: &str = include_str!("../shaders/fullscreen_quad.wgsl");
pub const SCENE_SHADER: &str = include_str!("../shaders/scene.wgsl");
pub const BLIT_FRAG: &str = include_str!("../shaders/blit.wgsl");
pub const FXAA_FRAG: &str = include_str!("../shaders/fxaa.wgsl");
pub const SMAA_EDGE_FRAG: &str = include_str!("../shaders/smaa_edge.wgsl");
pub const SMAA_WEIGHT_FRAG: &str = include_str!("../shaders/smaa_weight.wgsl");
pub const SMAA_BLEND_FRAG: &str = include_str!("../shaders/smaa_blend.wgsl");
pub const TAA_FRAG: &str = include_str!("../shaders/taa.wgsl");

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [(&str, &str); 8] = [
        ("fullscreen_quad", FULLSCREEN_QUAD_VERT),
        ("scene", SCENE_SHADER),
        ("blit", BLIT_FRAG),
        ("fxaa", FXAA_FRAG),
        ("smaa_edge", SMAA_EDGE_FRAG),
        ("smaa_weight", SMAA_WEIGHT_FRAG),
        ("smaa_blend", SMAA_BLEND_FRAG),
        ("taa", TAA_FRAG),
    ];

    fn is_ident(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_'
    }

    fn word_count(source: &str, word: &str) -> usize {
        source.split(|c: char| !is_ident(c)).filter(|w| *w == word).count()
    }

    #[test]
    fn test_module_constants_are_referenced() {
        for (name, source) in ALL {
            for line in source.lines() {
                let Some(rest) = line.trim_start().strip_prefix("const ") else {
                    continue;
                };
                let ident: String = rest.chars().take_while(|&c| is_ident(c)).collect();
                assert!(word_count(source, &ident) > 1, "{name}.wgsl: `{ident}` is never used");
            }
        }
    }

    #[test]
    fn test_weight_shader_matches_lookup_layout() {
        use crate::lookup::{AREATEX_HEIGHT, AREATEX_WIDTH, SEARCHTEX_HEIGHT, SEARCHTEX_WIDTH};

        let area = format!("1.0 / {AREATEX_WIDTH}.0, 1.0 / {AREATEX_HEIGHT}.0");
        let search = format!("vec2<f32>({SEARCHTEX_WIDTH}.0, {SEARCHTEX_HEIGHT}.0)");
        assert!(SMAA_WEIGHT_FRAG.contains(&area));
        assert!(SMAA_WEIGHT_FRAG.contains(&search));
    }
}
