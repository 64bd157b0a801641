pub mod device;
pub mod mesh_buffer;
pub mod renderer;
pub mod shaders;
pub mod software;
