mod flow;
mod layer_chain;
mod rate_model;
mod support;
