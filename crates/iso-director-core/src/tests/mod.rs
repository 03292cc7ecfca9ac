mod edl;
mod mode;
mod support;
