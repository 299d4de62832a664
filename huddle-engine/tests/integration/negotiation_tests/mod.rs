mod test_candidates_before_description;
mod test_colliding_offer_answered_by_answerer;
mod test_glare_two_peers;
mod test_negotiation_gives_up;
mod test_offer_before_presence;
