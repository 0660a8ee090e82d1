mod compare;
mod rewrite;
