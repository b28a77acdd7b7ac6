pub(crate) mod compositor;
pub(crate) mod cover;
pub(crate) mod surface;
