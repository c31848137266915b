mod test_polygon_basic;
