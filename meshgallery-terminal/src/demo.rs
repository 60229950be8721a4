/// Built-in gallery used when no directory is given
use meshgallery_core::{stl, FileEntry, MemorySource, Mesh};

/// (name, x, y, z) of every demo shape
const SHAPES: &[(&str, f32, f32, f32)] = &[
    ("cube", 1.0, 1.0, 1.0),
    ("tall-box", 0.6, 1.8, 0.6),
    ("flat-plate", 2.0, 0.2, 1.4),
    ("brick", 2.0, 0.6, 1.0),
    ("pillar", 0.4, 2.4, 0.4),
    ("tile", 1.2, 0.1, 1.2),
    ("crate", 1.4, 1.2, 1.4),
    ("beam", 3.0, 0.3, 0.3),
    ("slab", 1.6, 0.5, 1.6),
    ("domino", 0.5, 1.0, 0.15),
    ("shelf-board", 2.4, 0.1, 0.6),
    ("block", 0.8, 0.8, 1.6),
];

/// In-memory source with one binary STL per shape. Every other shape also
/// carries an OpenSCAD snippet as its paired source.
pub fn demo_gallery() -> (MemorySource, Vec<FileEntry>) {
    let mut source = MemorySource::new();
    let mut entries = Vec::with_capacity(SHAPES.len());

    for (index, &(name, x, y, z)) in SHAPES.iter().enumerate() {
        let file = format!("{name}.stl");
        source.insert(file.clone(), stl::encode_binary(&Mesh::cuboid(x, y, z)));

        let mut entry = FileEntry::new(file.clone(), file);
        if index % 2 == 0 {
            let scad = format!("{name}.scad");
            source.insert(
                scad.clone(),
                format!("// {name}\ncube([{x}, {y}, {z}], center = true);\n"),
            );
            entry = entry.with_source(scad);
        }
        entries.push(entry);
    }
    (source, entries)
}
