mod kernels;
mod summary;
