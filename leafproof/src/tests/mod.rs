mod test_tampering;
