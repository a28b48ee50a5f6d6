//! Animation model: owns a decoded MD2 + PCX pair, holds mutable pose and
//! playback state, and produces the culled, projected triangle stream each
//! render pulls from.

use std::path::Path;

use log::{debug, trace};
use q2raster_common::md2::{self, Md2Data};
use q2raster_common::pcx::{self, PcxImage};
use q2raster_common::rotation;
use q2raster_common::vec3::{self, Vec3};

use crate::error::ModelError;
use crate::geometry::{ProjectedTriangle, RenderType, TexPoint, TexturedFace};

/// `object_viewer` starts at this point before the pose rotation is
/// applied; a magic number tied to the models' rest-pose scale, not a
/// tunable camera parameter.
const OBJECT_VIEWER_ORIGIN: Vec3 = [0.0, 150.0, 0.0];
const VIEWING_DISTANCE: f32 = -1500.0;

pub struct Model {
    md2: Md2Data,
    texture: PcxImage,

    rotation: Vec3,
    scale: f32,
    translation: Vec3,

    current_frame: u32,
    current_sequence: u32,
    render_type: RenderType,

    world_coords: Vec<Vec3>,
    should_rotate: Vec<bool>,
}

impl Model {
    pub fn load(md2_path: impl AsRef<Path>, pcx_path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let md2_path = md2_path.as_ref();
        let pcx_path = pcx_path.as_ref();
        debug!("loading model {} with skin {}", md2_path.display(), pcx_path.display());

        let md2_bytes = std::fs::read(md2_path).map_err(|source| ModelError::Io { path: md2_path.to_path_buf(), source })?;
        let md2 = md2::decode(&md2_bytes).map_err(|source| ModelError::Decode { path: md2_path.to_path_buf(), source })?;

        let pcx_bytes = std::fs::read(pcx_path).map_err(|source| ModelError::Io { path: pcx_path.to_path_buf(), source })?;
        let texture = pcx::decode(&pcx_bytes).map_err(|source| ModelError::Decode { path: pcx_path.to_path_buf(), source })?;

        let num_vertices = md2.header.num_vertices as usize;
        debug!("loaded model: {} frames, {} sequences, {} vertices", md2.frames.len(), md2.sequences.len(), num_vertices);

        Ok(Self {
            md2,
            texture,
            rotation: [0.0, 0.0, 0.0],
            scale: 1.0,
            translation: [0.0, 0.0, 0.0],
            current_frame: 0,
            current_sequence: 0,
            render_type: RenderType::Textured,
            world_coords: vec![[0.0, 0.0, 0.0]; num_vertices],
            should_rotate: vec![false; num_vertices],
        })
    }

    pub fn rotate(&mut self, angle_x: f32, angle_y: f32, angle_z: f32) {
        self.rotation = [angle_x, angle_y, angle_z];
    }

    pub fn scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.translation = [x, y, z];
    }

    pub fn set_render_type(&mut self, render_type: RenderType) {
        self.render_type = render_type;
    }

    pub fn render_type(&self) -> RenderType {
        self.render_type
    }

    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    pub fn current_sequence(&self) -> u32 {
        self.current_sequence
    }

    pub fn sequence_count(&self) -> usize {
        self.md2.sequences.len()
    }

    pub fn advance_frame(&mut self) {
        self.current_frame += 1;
        let seq = &self.md2.sequences[self.current_sequence as usize];
        if self.current_frame >= seq.start_frame + seq.frame_count {
            self.current_frame = seq.start_frame;
            trace!("sequence {} wrapped to frame {}", self.current_sequence, self.current_frame);
        }
    }

    pub fn advance_sequence(&mut self) {
        self.current_sequence = (self.current_sequence + 1) % self.md2.sequences.len() as u32;
        self.current_frame = self.md2.sequences[self.current_sequence as usize].start_frame;
        trace!("advanced to sequence {}", self.current_sequence);
    }

    /// Preserves the source's off-by-one at the wrap boundary: sequence
    /// index 1 wraps to the last sequence instead of decrementing to 0.
    pub fn previous_sequence(&mut self) {
        let tentative = self.current_sequence as i32 - 1;
        self.current_sequence = if tentative > 0 { tentative as u32 } else { self.md2.sequences.len() as u32 - 1 };
        self.current_frame = self.md2.sequences[self.current_sequence as usize].start_frame;
        trace!("previous_sequence -> {}", self.current_sequence);
    }

    fn apply_transformations(&mut self) {
        let r = rotation::compose(self.rotation);
        let frame = &self.md2.frames[self.current_frame as usize];

        for (i, should) in self.should_rotate.iter().enumerate() {
            if !*should {
                continue;
            }
            let v = &frame.vertices[i];
            let scaled = vec3::scale([v.x, v.y, v.z], self.scale);
            let rotated = rotation::transform_row(scaled, &r);
            self.world_coords[i] = vec3::add(rotated, self.translation);
        }
    }

    /// Culls and projects the current frame's faces, returning the visible
    /// triangles. Not restartable: a fresh call re-evaluates culling
    /// against whatever frame/pose is current at call time.
    pub fn triangles_in_frame(&mut self) -> Vec<ProjectedTriangle<'_>> {
        let r = rotation::compose(self.rotation);
        let object_viewer = rotation::transform_row(OBJECT_VIEWER_ORIGIN, &r);

        let visible_faces: Vec<usize> = match self.render_type {
            RenderType::Wireframe => {
                self.should_rotate.iter_mut().for_each(|s| *s = true);
                (0..self.md2.faces.len()).collect()
            }
            RenderType::Textured => {
                self.should_rotate.iter_mut().for_each(|s| *s = false);
                let frame_normals = &self.md2.frames[self.current_frame as usize].face_normals;
                let mut faces = Vec::new();
                for (face_index, normal) in frame_normals.iter().enumerate() {
                    if vec3::dot(object_viewer, *normal) < 0.0 {
                        faces.push(face_index);
                        for p in self.md2.faces[face_index].p {
                            self.should_rotate[p] = true;
                        }
                    }
                }
                faces
            }
        };

        self.apply_transformations();

        let world_coords = &self.world_coords;
        let tex_coords = &self.md2.tex_coords;
        let faces = &self.md2.faces;
        let texture = &self.texture;

        visible_faces
            .into_iter()
            .map(|face_index| {
                let face = &faces[face_index];
                let w = [world_coords[face.p[0]], world_coords[face.p[1]], world_coords[face.p[2]]];

                // Preserved quirk: only the third term is divided by 3.
                let z_center = w[0][1] + w[1][1] + w[2][1] / 3.0;

                let screen_verts = std::array::from_fn(|i| {
                    crate::geometry::ScreenPoint::new(
                        (w[i][0] / w[i][1] * VIEWING_DISTANCE) as i32,
                        (w[i][2] / w[i][1] * VIEWING_DISTANCE) as i32,
                    )
                });
                let skin_verts = std::array::from_fn(|i| {
                    let t = &tex_coords[face.t[i]];
                    TexPoint::new(t.s as f32, t.t as f32)
                });

                ProjectedTriangle { z_center, face: TexturedFace { screen_verts, skin_verts, texture } }
            })
            .collect()
    }
}
