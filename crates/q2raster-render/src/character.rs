//! Composes a body model and a weapon model under one shared pose. Neither
//! sorts nor merges beyond concatenation — the render loop does that once
//! across both streams.

use std::path::Path;

use crate::error::ModelError;
use crate::geometry::{ProjectedTriangle, RenderType};
use crate::model::Model;

pub struct Character {
    body: Model,
    weapon: Model,
}

impl Character {
    pub fn load(body_md2: impl AsRef<Path>, body_pcx: impl AsRef<Path>, weapon_md2: impl AsRef<Path>, weapon_pcx: impl AsRef<Path>) -> Result<Self, ModelError> {
        Ok(Self { body: Model::load(body_md2, body_pcx)?, weapon: Model::load(weapon_md2, weapon_pcx)? })
    }

    pub fn rotate(&mut self, angle_x: f32, angle_y: f32, angle_z: f32) {
        self.body.rotate(angle_x, angle_y, angle_z);
        self.weapon.rotate(angle_x, angle_y, angle_z);
    }

    pub fn scale(&mut self, scale: f32) {
        self.body.scale(scale);
        self.weapon.scale(scale);
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.body.translate(x, y, z);
        self.weapon.translate(x, y, z);
    }

    pub fn set_render_type(&mut self, render_type: RenderType) {
        self.body.set_render_type(render_type);
        self.weapon.set_render_type(render_type);
    }

    pub fn advance_frame(&mut self) {
        self.body.advance_frame();
        self.weapon.advance_frame();
    }

    pub fn advance_sequence(&mut self) {
        self.body.advance_sequence();
        self.weapon.advance_sequence();
    }

    pub fn previous_sequence(&mut self) {
        self.body.previous_sequence();
        self.weapon.previous_sequence();
    }

    /// The body's triangle stream followed by the weapon's. Each model
    /// culls and projects independently; no sort is applied here.
    pub fn triangles_in_frame(&mut self) -> Vec<ProjectedTriangle<'_>> {
        let mut triangles = self.body.triangles_in_frame();
        triangles.extend(self.weapon.triangles_in_frame());
        triangles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use q2raster_common::pcx;

    fn write_minimal_md2(path: &Path) {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"IDP2");
        buf.extend_from_slice(&8i32.to_le_bytes());

        let frame_size = 4 * 4 + 16 + 4 * 1; // scale + translate + name + one vertex
        let offset_tex_coords = 68; // 4 (magic) + 4 (version) + 15 * 4 (header fields)
        let offset_faces = offset_tex_coords + 4; // one texcoord
        let offset_frames = offset_faces + 12; // one face

        let fields: [i32; 15] = [
            0, 0, frame_size, 0, 1, 1, 1, 0, 1, 0, offset_tex_coords, offset_faces, offset_frames, 0, 0,
        ];
        for f in fields {
            buf.extend_from_slice(&f.to_le_bytes());
        }

        // one texcoord
        buf.extend_from_slice(&0i16.to_le_bytes());
        buf.extend_from_slice(&0i16.to_le_bytes());

        // one degenerate-in-name-only face, reused for all three indices
        for v in [0i16, 0, 0, 0, 0, 0] {
            buf.extend_from_slice(&v.to_le_bytes());
        }

        // one frame: identity scale/translate, name "pose", one vertex (1,1,1,0)
        for s in [1.0f32, 1.0, 1.0] {
            buf.extend_from_slice(&s.to_le_bytes());
        }
        for t in [0.0f32, 0.0, 0.0] {
            buf.extend_from_slice(&t.to_le_bytes());
        }
        let mut name = [0u8; 16];
        name[..4].copy_from_slice(b"pose");
        buf.extend_from_slice(&name);
        buf.extend_from_slice(&[1u8, 1, 1, 0]);

        std::fs::write(path, buf).expect("write md2 fixture");
    }

    fn write_minimal_pcx(path: &Path) {
        let mut buf = vec![0u8; pcx::HEADER_SIZE];
        buf[0] = 0x0a;
        buf[1] = 5;
        buf[2] = 1;
        buf[3] = 8;
        buf[65] = 1;
        buf.push(0);
        buf.extend_from_slice(&[0u8; pcx::PALETTE_SIZE]);
        std::fs::write(path, buf).expect("write pcx fixture");
    }

    /// Shared-pose forwarding: rotating/scaling/translating a Character
    /// moves both constituent models identically.
    #[test]
    fn pose_setters_forward_to_both_models() {
        let dir = std::env::temp_dir().join("q2raster-character-test");
        std::fs::create_dir_all(&dir).expect("create fixture dir");
        let md2_path = dir.join("fixture.md2");
        let pcx_path = dir.join("fixture.pcx");
        write_minimal_md2(&md2_path);
        write_minimal_pcx(&pcx_path);

        let mut character = Character::load(&md2_path, &pcx_path, &md2_path, &pcx_path).expect("load character");
        character.set_render_type(RenderType::Wireframe);
        character.rotate(10.0, 20.0, 30.0);
        character.scale(2.0);
        character.translate(1.0, 2.0, 3.0);

        // Both streams are present and share the same pose, so their
        // projected geometry is identical.
        let triangles = character.triangles_in_frame();
        assert_eq!(triangles.len(), 2);
        let a = &triangles[0].face.screen_verts;
        let b = &triangles[1].face.screen_verts;
        assert_eq!(a, b);
    }
}
