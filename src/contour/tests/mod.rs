mod test_assemble_basic;
mod test_engine_basic;
mod test_fill_basic;
mod test_intersect_basic;
