pub(crate) mod blend;
pub(crate) mod renderer;
pub(crate) mod shrink;
