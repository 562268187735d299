/*!

This is the long-form manual for `smart_voting` and `smartvote`.

## Roles

* **Admins** sign in with a username and a password. The store starts with a
  single account, `admin` / `admin123`. Admins create and delete elections,
  register candidates and voters, look at the results and publish them.
* **Voters** sign in with the ID they received at registration (for example
  `V3K9QZ`). Each ID can be used to vote exactly once. Voter IDs are unique
  across all the elections: the ID alone tells which election the voter
  belongs to.

## Lifecycle of an election

1. The election is created empty. Its name must be unique.
2. Candidates and voters are registered. Candidates appear on the ballot in
   registration order. Voters must be at least 18.
3. Voters cast their ballots, optionally leaving a suggestion.
4. The results are published. Until then, nobody can see the counts, not even
   through the admin results page. Publishing cannot be undone.
5. The election may be deleted, with everything it contains.

Removing a candidate also removes the votes cast for them; the voters who
chose that candidate are not given their vote back. Removing a voter keeps the
suggestions they left.

## Results

For every candidate, the number of votes and the share of the total (with two
decimals). The winner is the candidate with the most votes. When several
candidates share the highest count, all of them are listed and the tie is
broken with the tie-break mode:

* `candidate-order` (default): the candidate registered first wins.
* `random`: the tied candidate IDs are hashed (SHA-256) with the `--seed`
  value, the smallest digest wins. Different seeds give different outcomes,
  the same seed always gives the same outcome.

## Storage

Everything is kept in one JSON file (`election_data.json` by default, see the
`--store` flag). The file is rewritten in full after every change: it is
first written next to the target and then moved over it, so an interrupted
write leaves the previous version intact.

```text
{
    "admins": [
        {
            "username": "admin",
            "password": "admin123"
        }
    ],
    "elections": {
        "City Council": {
            "candidates": [
                {
                    "id": "CAB12C",
                    "name": "Alice",
                    "party": "Green"
                }
            ],
            "voters": {
                "VZ9K2Q": {
                    "name": "Sam",
                    "age": 30,
                    "voted": true
                }
            },
            "votes": {
                "CAB12C": 1
            },
            "suggestions": [
                {
                    "voter": "VZ9K2Q",
                    "text": "More polling stations"
                }
            ],
            "results_published": false
        }
    }
}
```

The order of the elections and of the voters in the file is the order in
which they are listed in the menus.

A file may be edited by hand, but it is refused when loaded if an ID appears
twice anywhere in the file, if a candidate has no entry in `votes`, or if an
entry in `votes` does not belong to a candidate of the same election.

Only one session should use a given file at a time: there is no locking, the
last writer wins.

 */
