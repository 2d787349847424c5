// Bake the data directory into a single deflate-compressed JSON object.

use std::{fs, path::Path};

fn main() {
    println!("cargo:rerun-if-changed=../data");

    let mut files: Vec<_> = fs::read_dir("../data")
        .expect("missing data directory")
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|x| x == "json"))
        .collect();
    files.sort();

    // Each file becomes a field named after the file stem.
    let mut data = String::from("{\n");
    for (i, path) in files.iter().enumerate() {
        let stem = path.file_stem().unwrap().to_string_lossy();
        let body = fs::read_to_string(path).unwrap();
        if i > 0 {
            data.push_str(",\n");
        }
        data.push_str(&format!("\"{stem}\": {body}"));
    }
    data.push_str("\n}\n");

    let out = std::env::var("OUT_DIR").unwrap();
    let z = fdeflate::compress_to_vec(data.as_bytes());
    fs::write(Path::new(&out).join("data.json.z"), z).unwrap();
}
