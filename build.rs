fn main() {
	prost_build::compile_protos(&["proto/hn_archive.proto"], &["proto/"]).expect("failed to compile protobuf schema");
}
