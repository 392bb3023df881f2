/*!

# Quick start with an online form

This example runs a club election end to end, using an online form to collect
the votes.

We elect a president (one seat, candidates Alice, Bob and Carol) and a
secretary (one seat, candidates Alice, Dave and Erin). Create a form with one
question per position. For each question, add one drop-down per preference:
`President [1]`, `President [2]`, `President [3]`, each listing the candidates.
Ask the voters for an identifier (for example a student ID) so that only the
last response of each voter counts.

**Getting the results** Export the responses as a CSV file. It should look like
this:

```text
Timestamp,Student ID,President [1],President [2],President [3],Secretary [1],Secretary [2],Secretary [3]
2022/03/01 10:01,s1,Alice,Bob,Carol,Alice,Dave,Erin
2022/03/01 10:05,s2,Bob,Carol,Alice,Dave,Erin,Alice
```

**Counting** Write a configuration file next to the CSV file (see the
[configuration section](../manual/index.html#configuration)) and run:

```bash
hcvote --config election.json --out stdout
```

You should see the outcome of the election:

```text
[2022-03-02T09:55:59Z INFO  hcvote::hcv] Counting position President (1 vacancies, 3 candidates)
[2022-03-02T09:55:59Z INFO  hare_clark] Counting 5 ballots for 1 vacancies, quota: 4
[2022-03-02T09:55:59Z INFO  hare_clark] Elected: ["Alice"]
[2022-03-02T09:55:59Z INFO  hcvote::hcv] Counting position Secretary (1 vacancies, 3 candidates)
[2022-03-02T09:55:59Z INFO  hare_clark] Counting 5 ballots for 1 vacancies, quota: 4
[2022-03-02T09:55:59Z INFO  hare_clark] Elected: ["Dave"]
```

Alice won the presidency, so she was excluded from the count for secretary and
her ballots went to their next preference. Add `--verbose` to follow every
election, exclusion and transfer.

For a single position, no configuration file is needed:

```bash
hcvote --input ballots.csv --header --vacancies 2 \
  --candidates Platypus --candidates Wombat --candidates Emu --candidates Koala
```

*/
