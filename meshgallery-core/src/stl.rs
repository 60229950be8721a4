/// STL codec for binary and ASCII formats
use nom::{
    bytes::complete::{tag, take, take_till},
    character::complete::{multispace0, multispace1},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::MeshError;
use crate::geometry::{Mesh, Triangle, Vertex};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, MeshError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(MeshError::TooSmall(data.len()));
    }

    let (body, triangle_count) = binary_header(data).map_err(|_| MeshError::TooSmall(data.len()))?;
    let triangle_count = triangle_count as usize;
    let available = body.len() / FACET_LEN;
    if available < triangle_count {
        return Err(MeshError::Truncated {
            declared: triangle_count,
            available,
        });
    }

    let (_, triangles) = count(binary_facet, triangle_count)(body).map_err(|_| MeshError::Truncated {
        declared: triangle_count,
        available,
    })?;

    Ok(Mesh { triangles })
}

fn binary_header(input: &[u8]) -> IResult<&[u8], u32> {
    preceded(take(HEADER_LEN), le_u32)(input)
}

fn binary_vector(input: &[u8]) -> IResult<&[u8], (f32, f32, f32)> {
    tuple((le_f32, le_f32, le_f32))(input)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, (nx, ny, nz)) = binary_vector(input)?;
    let (input, corners) = count(binary_vector, 3)(input)?;
    // Attribute byte count, unused
    let (input, _) = le_u16(input)?;

    let v: Vec<Vertex> = corners
        .into_iter()
        .map(|(x, y, z)| Vertex::new(x, y, z, nx, ny, nz))
        .collect();
    Ok((input, Triangle::new(v[0], v[1], v[2])))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, MeshError> {
    match parse_ascii_stl_impl(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(e) => Err(MeshError::Ascii(format!("{:?}", e))),
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    // Optional solid name runs to the end of the line
    let (input, _) = take_till(|c| c == '\n')(input)?;
    let (input, triangles) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;

    Ok((input, Mesh { triangles }))
}

fn parse_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input, normal)?;
    let (input, v2) = parse_vertex(input, normal)?;
    let (input, v3) = parse_vertex(input, normal)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, Triangle::new(v1, v2, v3)))
}

fn parse_vertex(input: &str, normal: (f32, f32, f32)) -> IResult<&str, Vertex> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    let (input, (x, y, z)) = parse_vector3(input)?;
    Ok((input, Vertex::new(x, y, z, normal.0, normal.1, normal.2)))
}

fn parse_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

/// Detect and parse STL file (binary or ASCII)
///
/// Binary files may also start with `solid`, so ASCII is only taken when it
/// parses cleanly.
pub fn parse_stl(data: &[u8]) -> Result<Mesh, MeshError> {
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}

/// Encode a mesh as binary STL with a zeroed header
pub fn encode_binary(mesh: &Mesh) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + 4 + mesh.triangles.len() * FACET_LEN);
    out.extend_from_slice(&[0u8; HEADER_LEN]);
    out.extend_from_slice(&(mesh.triangles.len() as u32).to_le_bytes());

    for triangle in &mesh.triangles {
        let normal = triangle.calculate_normal();
        for component in normal.iter() {
            out.extend_from_slice(&component.to_le_bytes());
        }
        for vertex in &triangle.vertices {
            for component in vertex.position.coords.iter() {
                out.extend_from_slice(&component.to_le_bytes());
            }
        }
        out.extend_from_slice(&0u16.to_le_bytes());
    }

    out
}
