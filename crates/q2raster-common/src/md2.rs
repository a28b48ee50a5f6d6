//! MD2 binary decoder: header, texture coordinates, faces, and per-frame
//! dequantized vertices, plus the two pure derivations that ride on top of
//! the decoded frame list — animation sequence grouping and per-face
//! normals — since neither depends on any mutable pose state.

use crate::error::DecodeError;
use crate::vec3::{self, Vec3};

const MAGIC: &[u8; 4] = b"IDP2";
const VERSION: i32 = 8;
const HEADER_FIELDS: usize = 15;
const HEADER_SIZE: usize = 4 + 4 + HEADER_FIELDS * 4;

#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub skin_width: i32,
    pub skin_height: i32,
    pub frame_size: i32,
    pub num_skins: i32,
    pub num_vertices: i32,
    pub num_tex_coords: i32,
    pub num_faces: i32,
    pub num_gl_commands: i32,
    pub num_frames: i32,
    pub offset_skins: i32,
    pub offset_tex_coords: i32,
    pub offset_faces: i32,
    pub offset_frames: i32,
    pub offset_gl_commands: i32,
    pub offset_end: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct TexCoord {
    pub s: i16,
    pub t: i16,
}

/// Three vertex indices plus three texture-coordinate indices, already
/// validated against their respective tables at decode time.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    pub p: [usize; 3],
    pub t: [usize; 3],
}

#[derive(Debug, Clone, Copy)]
pub struct FrameVertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub light_normal_index: u8,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub name: String,
    pub vertices: Vec<FrameVertex>,
    /// `face_normals[i]` is the unnormalized normal of `faces[i]` in this frame.
    pub face_normals: Vec<Vec3>,
}

#[derive(Debug, Clone)]
pub struct Sequence {
    pub name: String,
    pub start_frame: u32,
    pub frame_count: u32,
}

#[derive(Debug, Clone)]
pub struct Md2Data {
    pub header: Header,
    pub tex_coords: Vec<TexCoord>,
    pub faces: Vec<Face>,
    pub frames: Vec<Frame>,
    pub sequences: Vec<Sequence>,
}

fn read_i32(raw: &[u8], offset: usize) -> Result<i32, DecodeError> {
    let bytes = raw.get(offset..offset + 4).ok_or(DecodeError::TruncatedMd2)?;
    Ok(i32::from_le_bytes(bytes.try_into().unwrap()))
}

fn read_i16(raw: &[u8], offset: usize) -> Result<i16, DecodeError> {
    let bytes = raw.get(offset..offset + 2).ok_or(DecodeError::TruncatedMd2)?;
    Ok(i16::from_le_bytes(bytes.try_into().unwrap()))
}

fn read_f32(raw: &[u8], offset: usize) -> Result<f32, DecodeError> {
    let bytes = raw.get(offset..offset + 4).ok_or(DecodeError::TruncatedMd2)?;
    Ok(f32::from_le_bytes(bytes.try_into().unwrap()))
}

fn read_header(raw: &[u8]) -> Result<Header, DecodeError> {
    if raw.len() < HEADER_SIZE || &raw[0..4] != MAGIC {
        return Err(DecodeError::UnsupportedMd2);
    }
    if read_i32(raw, 4)? != VERSION {
        return Err(DecodeError::UnsupportedMd2);
    }

    let mut fields = [0i32; HEADER_FIELDS];
    for (i, field) in fields.iter_mut().enumerate() {
        *field = read_i32(raw, 8 + i * 4)?;
    }

    Ok(Header {
        skin_width: fields[0],
        skin_height: fields[1],
        frame_size: fields[2],
        num_skins: fields[3],
        num_vertices: fields[4],
        num_tex_coords: fields[5],
        num_faces: fields[6],
        num_gl_commands: fields[7],
        num_frames: fields[8],
        offset_skins: fields[9],
        offset_tex_coords: fields[10],
        offset_faces: fields[11],
        offset_frames: fields[12],
        offset_gl_commands: fields[13],
        offset_end: fields[14],
    })
}

fn read_tex_coords(raw: &[u8], header: &Header) -> Result<Vec<TexCoord>, DecodeError> {
    let mut out = Vec::with_capacity(header.num_tex_coords.max(0) as usize);
    let base = header.offset_tex_coords as usize;
    for i in 0..header.num_tex_coords as usize {
        let offset = base + i * 4;
        out.push(TexCoord { s: read_i16(raw, offset)?, t: read_i16(raw, offset + 2)? });
    }
    Ok(out)
}

fn validated_index(raw_index: i16, len: usize) -> Result<usize, DecodeError> {
    if raw_index < 0 || raw_index as usize >= len {
        return Err(DecodeError::IndexOutOfRange { index: raw_index as usize, len });
    }
    Ok(raw_index as usize)
}

fn read_faces(raw: &[u8], header: &Header, num_vertices: usize, num_tex_coords: usize) -> Result<Vec<Face>, DecodeError> {
    let mut out = Vec::with_capacity(header.num_faces.max(0) as usize);
    let base = header.offset_faces as usize;
    for i in 0..header.num_faces as usize {
        let offset = base + i * 12;
        let p = [
            validated_index(read_i16(raw, offset)?, num_vertices)?,
            validated_index(read_i16(raw, offset + 2)?, num_vertices)?,
            validated_index(read_i16(raw, offset + 4)?, num_vertices)?,
        ];
        let t = [
            validated_index(read_i16(raw, offset + 6)?, num_tex_coords)?,
            validated_index(read_i16(raw, offset + 8)?, num_tex_coords)?,
            validated_index(read_i16(raw, offset + 10)?, num_tex_coords)?,
        ];
        out.push(Face { p, t });
    }
    Ok(out)
}

fn strip_non_alpha(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphabetic()).collect()
}

fn read_frame(raw: &[u8], header: &Header, frame_index: usize, faces: &[Face]) -> Result<Frame, DecodeError> {
    let frame_start = header.offset_frames as usize + frame_index * header.frame_size as usize;

    let scale = [
        read_f32(raw, frame_start)?,
        read_f32(raw, frame_start + 4)?,
        read_f32(raw, frame_start + 8)?,
    ];
    let translate = [
        read_f32(raw, frame_start + 12)?,
        read_f32(raw, frame_start + 16)?,
        read_f32(raw, frame_start + 20)?,
    ];
    let name_bytes = raw.get(frame_start + 24..frame_start + 40).ok_or(DecodeError::TruncatedMd2)?;
    let nul_at = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
    let name = String::from_utf8_lossy(&name_bytes[..nul_at]).into_owned();

    let verts_start = frame_start + 40;
    let mut vertices = Vec::with_capacity(header.num_vertices.max(0) as usize);
    for i in 0..header.num_vertices as usize {
        let offset = verts_start + i * 4;
        let record = raw.get(offset..offset + 4).ok_or(DecodeError::TruncatedMd2)?;
        vertices.push(FrameVertex {
            x: record[0] as f32 * scale[0] + translate[0],
            y: record[1] as f32 * scale[1] + translate[1],
            z: record[2] as f32 * scale[2] + translate[2],
            light_normal_index: record[3],
        });
    }

    let face_normals = compute_face_normals(faces, &vertices);
    Ok(Frame { name, vertices, face_normals })
}

/// `normal[f] = (V[f.p2] - V[f.p1]) x (V[f.p3] - V[f.p2])`, left unnormalized.
pub fn compute_face_normals(faces: &[Face], vertices: &[FrameVertex]) -> Vec<Vec3> {
    faces
        .iter()
        .map(|face| {
            let v1 = vertex_position(vertices, face.p[0]);
            let v2 = vertex_position(vertices, face.p[1]);
            let v3 = vertex_position(vertices, face.p[2]);
            vec3::cross(vec3::subtract(v2, v1), vec3::subtract(v3, v2))
        })
        .collect()
}

fn vertex_position(vertices: &[FrameVertex], index: usize) -> Vec3 {
    let v = &vertices[index];
    [v.x, v.y, v.z]
}

/// Group frames into contiguous runs sharing a common letters-only name.
/// Partitions `[0, frames.len())` with no gaps or overlaps.
pub fn derive_sequences(frames: &[Frame]) -> Vec<Sequence> {
    let mut sequences: Vec<Sequence> = Vec::new();
    let mut last_group_name: Option<String> = None;

    for (frame_index, frame) in frames.iter().enumerate() {
        let group_name = strip_non_alpha(&frame.name);
        if last_group_name.as_deref() != Some(group_name.as_str()) {
            if let Some(prior) = sequences.last_mut() {
                prior.frame_count = frame_index as u32 - prior.start_frame;
            }
            sequences.push(Sequence { name: group_name.clone(), start_frame: frame_index as u32, frame_count: 0 });
            last_group_name = Some(group_name);
        }
    }

    if let Some(last) = sequences.last_mut() {
        last.frame_count = frames.len() as u32 - last.start_frame;
    }

    sequences
}

/// Decode a full MD2 buffer into header, tables, frames, and derived sequences.
pub fn decode(raw: &[u8]) -> Result<Md2Data, DecodeError> {
    let header = read_header(raw)?;
    let tex_coords = read_tex_coords(raw, &header)?;
    let faces = read_faces(raw, &header, header.num_vertices as usize, header.num_tex_coords as usize)?;

    let mut frames = Vec::with_capacity(header.num_frames.max(0) as usize);
    for frame_index in 0..header.num_frames as usize {
        frames.push(read_frame(raw, &header, frame_index, &faces)?);
    }

    let sequences = derive_sequences(&frames);

    Ok(Md2Data { header, tex_coords, faces, frames, sequences })
}
