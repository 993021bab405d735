mod correlate_test;
