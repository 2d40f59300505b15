mod checkpoints;
mod segments;
