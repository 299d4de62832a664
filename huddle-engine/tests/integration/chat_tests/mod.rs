mod test_order_across_subscribers;
