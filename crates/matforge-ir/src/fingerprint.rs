//! Content-addressable material fingerprints.
//!
//! A fingerprint identifies a material by what it looks like on disk: the
//! geometry file of its owner, its own name, and the file names of the
//! textures it references. The same shader bag always hashes to the same id,
//! regardless of node insertion order, so preset lookups survive scene
//! rebuilds.

/// Hashes the identity triple into a lowercase hex id.
///
/// Texture entries are reduced to their base file names, sorted, and the
/// whole key is lowercased before hashing, so path prefixes, ordering, and
/// case differences between hosts do not split identities.
pub fn shader_fingerprint(geometry_file: &str, material_name: &str, textures: &[String]) -> String {
    let mut names: Vec<String> = textures.iter().map(|t| texture_file_name(t)).collect();
    names.sort();
    let mut key = format!(
        "{}|{}",
        texture_file_name(geometry_file),
        material_name
    );
    for name in &names {
        key.push('|');
        key.push_str(name);
    }
    blake3::hash(key.to_lowercase().as_bytes()).to_hex().to_string()
}

/// The fingerprint of a material with no texture maps at all. Used as the
/// second lookup key when the full fingerprint misses, so a preset can match
/// every material of an object regardless of its maps.
pub fn default_fingerprint(geometry_file: &str, material_name: &str) -> String {
    shader_fingerprint(geometry_file, material_name, &[])
}

/// Base file name of a texture path, with both separator styles handled.
pub fn texture_file_name(path: &str) -> String {
    path.rsplit(['/', '\\']).next().unwrap_or(path).to_string()
}
