//! OBJ models and the static test image, loaded into `ModelData` for upload.

use std::path::Path;

use aastudio_wgpu::mesh::{MeshData, ModelData, TextureData};
use anyhow::{Context, Result};

/// Load an OBJ file (with its MTL, if any) and every diffuse texture it names.
///
/// A material whose texture cannot be read is drawn white; a missing or
/// unparsable OBJ is an error.
pub fn load_obj(path: &Path) -> Result<ModelData> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        },
    )
    .with_context(|| format!("failed to load model {}", path.display()))?;

    let materials = materials.unwrap_or_else(|e| {
        log::warn!("{}: no materials ({e})", path.display());
        Vec::new()
    });

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let materials = materials
        .iter()
        .map(|material| {
            let file = material.diffuse_texture.as_deref()?;
            let texture_path = base_dir.join(file.replace('\\', "/"));
            match load_texture(&texture_path) {
                Ok(texture) => Some(texture),
                Err(e) => {
                    log::warn!("Material '{}': {e:#}", material.name);
                    None
                }
            }
        })
        .collect();

    let meshes = models
        .into_iter()
        .map(|model| {
            let mesh = model.mesh;
            MeshData {
                positions: mesh.positions,
                normals: mesh.normals,
                uvs: flip_v(mesh.texcoords),
                indices: mesh.indices,
                material: mesh.material_id,
            }
        })
        .collect();

    Ok(ModelData {
        name: model_name(path),
        meshes,
        materials,
    })
}

/// Decode an image file to 8-bit RGBA, rows top first.
pub fn load_texture(path: &Path) -> Result<TextureData> {
    let image = image::open(path)
        .with_context(|| format!("failed to load image {}", path.display()))?
        .to_rgba8();
    Ok(TextureData {
        width: image.width(),
        height: image.height(),
        pixels: image.into_raw(),
    })
}

/// The test image on a quad in the z = 0 plane, centered on the origin.
/// The longer side spans [-1, 1].
pub fn load_image_quad(path: &Path) -> Result<ModelData> {
    let texture = load_texture(path)?;
    Ok(image_quad(texture, model_name(path)))
}

fn image_quad(texture: TextureData, name: String) -> ModelData {
    let (w, h) = (texture.width.max(1) as f32, texture.height.max(1) as f32);
    let (hx, hy) = if w >= h { (1.0, h / w) } else { (w / h, 1.0) };

    #[rustfmt::skip]
    let positions = vec![
        -hx, -hy, 0.0,
         hx, -hy, 0.0,
         hx,  hy, 0.0,
        -hx,  hy, 0.0,
    ];
    #[rustfmt::skip]
    let uvs = vec![
        0.0, 1.0,
        1.0, 1.0,
        1.0, 0.0,
        0.0, 0.0,
    ];

    ModelData {
        name,
        meshes: vec![MeshData {
            positions,
            normals: [0.0, 0.0, 1.0].repeat(4),
            uvs,
            indices: vec![0, 1, 2, 0, 2, 3],
            material: Some(0),
        }],
        materials: vec![Some(texture)],
    }
}

/// OBJ texture coordinates have v pointing up; textures are stored top row first.
fn flip_v(mut texcoords: Vec<f32>) -> Vec<f32> {
    for uv in texcoords.chunks_exact_mut(2) {
        uv[1] = 1.0 - uv[1];
    }
    texcoords
}

fn model_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aastudio-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_flip_v() {
        assert_eq!(flip_v(vec![0.25, 0.0, 0.5, 0.75]), vec![0.25, 1.0, 0.5, 0.25]);
    }

    #[test]
    fn test_image_quad_keeps_aspect() {
        let texture = TextureData {
            width: 4,
            height: 2,
            pixels: vec![0; 32],
        };
        let model = image_quad(texture, "wide".to_string());
        let mesh = &model.meshes[0];
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert_eq!(&mesh.positions[6..9], &[1.0, 0.5, 0.0]);
        assert_eq!(mesh.material, Some(0));
        assert!(model.materials[0].is_some());
    }

    #[test]
    fn test_load_obj_with_material() {
        let dir = temp_dir("obj");
        let mut png = image::RgbaImage::new(2, 2);
        png.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        png.save(dir.join("diffuse.png")).unwrap();
        std::fs::write(dir.join("tri.mtl"), "newmtl red\nmap_Kd diffuse.png\n").unwrap();
        std::fs::write(
            dir.join("tri.obj"),
            "mtllib tri.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nusemtl red\nf 1/1 2/2 3/3\n",
        )
        .unwrap();

        let model = load_obj(&dir.join("tri.obj")).unwrap();
        assert_eq!(model.name, "tri");
        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices.len(), 3);
        assert_eq!(mesh.material, Some(0));
        // v = 0 in the file is the bottom row.
        assert_eq!(&mesh.uvs[0..2], &[0.0, 1.0]);

        let texture = model.materials[0].as_ref().unwrap();
        assert_eq!((texture.width, texture.height, texture.pixels.len()), (2, 2, 16));
        assert_eq!(&texture.pixels[0..4], &[255, 0, 0, 255]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_texture_falls_back() {
        let dir = temp_dir("notex");
        std::fs::write(dir.join("q.mtl"), "newmtl m\nmap_Kd nowhere.png\n").unwrap();
        std::fs::write(
            dir.join("q.obj"),
            "mtllib q.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl m\nf 1 2 3\n",
        )
        .unwrap();

        let model = load_obj(&dir.join("q.obj")).unwrap();
        assert_eq!(model.materials.len(), 1);
        assert!(model.materials[0].is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_model_is_error() {
        let err = load_obj(Path::new("/nonexistent/aastudio/model.obj")).unwrap_err();
        assert!(format!("{err:#}").contains("model.obj"));
    }
}
