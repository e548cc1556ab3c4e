/*!
Follower snapshot diffing, session handling and the polling loop behind the
`unfollow-tracker` binary
*/

pub mod core;
