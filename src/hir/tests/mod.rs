mod tests_check;
