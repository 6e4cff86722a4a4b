//! Racing two independent waits

use std::future::Future;

use futures::future::Either;

/// Poll `left` and `right` together and return the output of whichever
/// finishes first. The other future is dropped without being polled again.
///
/// When both are ready on the same poll, `left` wins.
pub async fn first_of<A, B>(left: A, right: B) -> Either<A::Output, B::Output>
where
    A: Future,
    B: Future,
{
    tokio::select! {
        biased;
        a = left => Either::Left(a),
        b = right => Either::Right(b),
    }
}
